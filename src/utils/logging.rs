//! 日志工具模块
//!
//! 提供日志初始化、格式化和输出的辅助函数

use std::time::Duration;

use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::models::{ParsingMode, RunOutcome};
use crate::orchestrator::{ShutdownReport, WorkerExit};

/// 初始化日志
///
/// 设置了 `RUST_LOG` 时以它为准，否则按 `verbose` 选择 debug / info
pub fn init(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
///
/// # 参数
/// - `mode`: 解析模式
/// - `swipe_duration`: 单次滑动时长
pub fn log_startup(mode: ParsingMode, swipe_duration: Duration) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - 多设备自动滚动模式");
    info!("📋 解析模式: {}", mode);
    info!("⏱ 滑动时长: {:.2}s", swipe_duration.as_secs_f64());
    info!("{}", "=".repeat(60));
}

/// 记录设备发现结果
pub fn log_devices_found(serials: &[String]) {
    info!("✓ 找到 {} 台设备", serials.len());
    for serial in serials {
        info!("  📱 {}", serial);
    }
}

/// 打印最终统计信息
pub fn print_final_stats(report: &ShutdownReport) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部设备运行结束");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    if report.interrupted {
        info!("🛑 本次运行由中断信号结束");
    }
    info!("{}", "=".repeat(60));
    for worker in &report.workers {
        match worker.exit {
            WorkerExit::Finished(outcome) => info!("  [设备 {}] {}", worker.serial, outcome),
            WorkerExit::ForceTerminated => info!("  [设备 {}] 强制终止", worker.serial),
        }
    }
    info!("{}", "─".repeat(60));
    info!(
        "✅ 完成: {}/{}",
        report.count(RunOutcome::Completed),
        report.workers.len()
    );
    info!(
        "🛑 取消: {}",
        report.count(RunOutcome::CancelledBeforeStart) + report.count(RunOutcome::CancelledDuringRun)
    );
    info!("❌ 失败: {}", report.count(RunOutcome::Failed));
    info!("💀 强制终止: {}", report.force_terminated());
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
