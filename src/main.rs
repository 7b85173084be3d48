use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::error;

use feed_scroller::utils::logging;
use feed_scroller::{App, AppResult, Config, ParsingMode};

/// 多设备自动滚动
#[derive(Parser, Debug)]
#[command(name = "feed-scroller", version, about)]
struct Cli {
    /// 单次滑动动画时长（秒）
    #[arg(short, long, default_value_t = 0.5)]
    duration: f64,

    /// 解析模式
    #[arg(short, long, value_enum, default_value_t = ParsingMode::Recommendations)]
    parsing: ParsingMode,

    /// 配置文件路径（不存在时使用默认配置）
    #[arg(short, long, default_value = "scroller.toml")]
    config: PathBuf,

    /// 显示详细日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // 先读配置，日志级别可能来自配置文件
    let config = Config::load(Some(&cli.config));
    let verbose = cli.verbose || config.as_ref().is_ok_and(|c| c.verbose_logging);
    logging::init(verbose);

    match run(&cli, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("❌ {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: AppResult<Config>) -> Result<()> {
    let config = config.with_context(|| format!("加载配置失败: {}", cli.config.display()))?;
    let swipe_duration = Duration::try_from_secs_f64(cli.duration)
        .with_context(|| format!("无效的滑动时长: {}", cli.duration))?;

    App::new(config).run(swipe_duration, cli.parsing).await?;
    Ok(())
}
