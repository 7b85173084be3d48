use std::fmt;

use clap::ValueEnum;

/// 解析模式，决定每个 worker 使用哪种会话
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ParsingMode {
    /// 按 links.txt 逐条回放视频链接
    Links,
    /// 滚动视频应用首页推荐
    #[default]
    Recommendations,
    /// 滚动搜索应用的资讯流
    Google,
}

impl ParsingMode {
    /// 该模式是否需要外部链接文件
    pub fn requires_links_file(self) -> bool {
        self == ParsingMode::Links
    }
}

impl fmt::Display for ParsingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ParsingMode::Links => "links",
            ParsingMode::Recommendations => "recommendations",
            ParsingMode::Google => "google",
        };
        f.write_str(label)
    }
}
