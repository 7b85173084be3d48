//! 视频应用首页推荐滚动
//!
//! 回到首页 → 以状态栏和底部导航栏为边界 → 固定次数上滑

use tracing::info;

use crate::config::YoutubeConfig;
use crate::error::AppResult;
use crate::models::Selector;
use crate::services::{ScreenRegion, SwipeInsets};
use crate::workflow::session::SessionTools;
use crate::workflow::session_ctx::SessionCtx;

pub struct VideoFeedSession {
    pub(crate) ctx: SessionCtx,
    pub(crate) tools: SessionTools,
    pub(crate) config: YoutubeConfig,
}

impl VideoFeedSession {
    pub fn new(ctx: SessionCtx, tools: SessionTools, config: YoutubeConfig) -> Self {
        Self { ctx, tools, config }
    }

    pub async fn scroll(&self) -> AppResult<()> {
        let home = Selector::description(&self.config.home_description)
            .with_class(&self.config.home_class);
        self.tools.click(&home).await?;

        let top = self
            .tools
            .locate(&Selector::resource_id(&self.config.top_anchor_id))
            .await?;
        let bottom = self
            .tools
            .locate(&Selector::resource_id(&self.config.feed_bottom_anchor_id))
            .await?;
        let region = ScreenRegion::between(top, bottom.top)?;

        info!(
            "{} 📜 开始滚动推荐页: 区域 {}..{}, 共 {} 次",
            self.ctx,
            region.top(),
            region.bottom(),
            self.config.recommendation_swipes
        );

        self.tools
            .swipe_times(
                &region,
                self.config.recommendation_swipes,
                self.ctx.swipe_duration,
                SwipeInsets::default(),
            )
            .await?;

        info!("{} ✓ 推荐页滚动完成", self.ctx);
        Ok(())
    }
}
