//! 视频链接回放
//!
//! 逐条打开链接，按屏幕分类结果决定：
//! - 评论区 / 概念卡片：点两下播放器，在视频页内滚动固定次数
//! - 赞助内容：追加到队尾稍后重试
//! - 无法判断：跳过
//!
//! 默认不限制赞助链接的重试次数，一条始终被判为赞助的链接会让队列无限增长，
//! 可通过 `youtube.max_sponsored_retries` 设置上限

use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::YoutubeConfig;
use crate::error::AppResult;
use crate::models::{ContentCategory, Selector};
use crate::services::{LinkQueue, ScreenClassifier, ScreenRegion, SwipeInsets};
use crate::utils::logging::truncate_text;
use crate::workflow::session::SessionTools;
use crate::workflow::session_ctx::SessionCtx;

/// 回放统计
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReplayStats {
    /// 已滚动的视频
    pub scrolled: usize,
    /// 重新入队的赞助链接
    pub requeued: usize,
    /// 超过重试上限被放弃的链接
    pub dropped: usize,
    /// 无法判断而跳过的链接
    pub skipped: usize,
}

pub struct LinkReplaySession {
    pub(crate) ctx: SessionCtx,
    pub(crate) tools: SessionTools,
    pub(crate) config: YoutubeConfig,
    classifier: ScreenClassifier,
    links_file: PathBuf,
}

impl LinkReplaySession {
    pub fn new(
        ctx: SessionCtx,
        tools: SessionTools,
        classifier: ScreenClassifier,
        config: YoutubeConfig,
        links_file: PathBuf,
    ) -> Self {
        Self {
            ctx,
            tools,
            config,
            classifier,
            links_file,
        }
    }

    pub async fn replay(&self) -> AppResult<ReplayStats> {
        let mut queue = LinkQueue::load(&self.links_file, self.config.max_sponsored_retries).await?;
        let mut stats = ReplayStats::default();

        while let Some(link) = queue.next_link() {
            if self.ctx.is_cancelled() {
                info!(
                    "{} 收到停止信号，剩余 {} 条链接未处理",
                    self.ctx,
                    queue.remaining() + 1
                );
                break;
            }

            info!(
                "{} ▶ 打开链接 {}/{}: {}",
                self.ctx,
                queue.processed(),
                queue.len(),
                truncate_text(&link, 80)
            );
            self.open_link(&link).await?;

            let category = self
                .classifier
                .wait_for_category(self.tools.device(), &self.ctx.cancel)
                .await?;
            info!("{} 内容类型: {}", self.ctx, category);

            match category {
                category if category.is_scrollable() => {
                    self.scroll_video().await?;
                    stats.scrolled += 1;
                }
                ContentCategory::Sponsored => {
                    if queue.requeue(link) {
                        stats.requeued += 1;
                    } else {
                        warn!("{} ⚠️ 赞助链接已达重试上限，放弃", self.ctx);
                        stats.dropped += 1;
                    }
                }
                _ => {
                    stats.skipped += 1;
                }
            }
        }

        info!(
            "{} ✓ 链接回放结束: 滚动 {}, 重新入队 {}, 放弃 {}, 跳过 {}",
            self.ctx, stats.scrolled, stats.requeued, stats.dropped, stats.skipped
        );
        Ok(stats)
    }

    /// 通过 VIEW intent 在视频应用中打开链接
    async fn open_link(&self, link: &str) -> AppResult<()> {
        self.tools
            .device()
            .shell(&format!(
                "am start -a android.intent.action.VIEW -d \"{}\" {}",
                link, self.config.package
            ))
            .await?;
        Ok(())
    }

    async fn scroll_video(&self) -> AppResult<()> {
        // 第一次点击可能只是让播放器获得焦点，两次都要点
        let player = Selector::resource_id(&self.config.player_id);
        self.tools.click(&player).await?;
        self.tools.click(&player).await?;

        let top = self
            .tools
            .locate(&Selector::resource_id(&self.config.top_anchor_id))
            .await?;
        let bottom = self
            .tools
            .locate(&Selector::resource_id(&self.config.link_bottom_anchor_id))
            .await?;
        let region = ScreenRegion::between(top, bottom.bottom)?;

        self.tools
            .swipe_times(
                &region,
                self.config.link_swipes,
                self.ctx.swipe_duration,
                SwipeInsets::with_bottom(self.config.link_bottom_inset),
            )
            .await?;
        Ok(())
    }
}
