use std::fmt;

/// 当前屏幕内容类型
///
/// 由单张截图临时推导得出，不做持久化
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentCategory {
    /// 评论区已加载的普通视频
    Comments,
    /// 带 "Key concepts" 卡片的视频
    ConceptCard,
    /// 赞助/广告内容
    Sponsored,
    /// 轮询预算内无法判断
    Undetermined,
}

impl ContentCategory {
    /// 是否需要在该视频上执行滚动
    pub fn is_scrollable(self) -> bool {
        matches!(self, ContentCategory::Comments | ContentCategory::ConceptCard)
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContentCategory::Comments => "comments",
            ContentCategory::ConceptCard => "concept",
            ContentCategory::Sponsored => "sponsored",
            ContentCategory::Undetermined => "undetermined",
        };
        f.write_str(label)
    }
}
