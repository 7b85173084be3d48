//! 搜索应用资讯流滚动
//!
//! 资讯流没有固定长度：一直滑动，直到出现"更多文章"之类的结尾标记，
//! 停顿后点一次 Discover 重新加载，再检查停止信号。

use std::time::Duration;

use tracing::{debug, info};

use crate::config::GoogleConfig;
use crate::error::{AppResult, DeviceError, DeviceResult, SessionError};
use crate::models::{Bounds, Selector};
use crate::services::{ScreenRegion, SwipeInsets};
use crate::workflow::session::SessionTools;
use crate::workflow::session_ctx::SessionCtx;

pub struct NewsFeedSession {
    pub(crate) ctx: SessionCtx,
    pub(crate) tools: SessionTools,
    pub(crate) config: GoogleConfig,
}

impl NewsFeedSession {
    pub fn new(ctx: SessionCtx, tools: SessionTools, config: GoogleConfig) -> Self {
        Self { ctx, tools, config }
    }

    pub async fn scroll(&self) -> AppResult<()> {
        let discover = Selector::resource_id(&self.config.discover_id);
        let discover_bounds = self.tools.click(&discover).await?;

        let top = self.voice_search_anchor().await?;
        let region = ScreenRegion::between(top, discover_bounds.top)?;
        let insets = SwipeInsets::with_bottom(self.config.bottom_inset);
        let pause = Duration::from_millis(self.config.feed_end_pause_ms);

        info!(
            "{} 📰 开始滚动资讯流: 区域 {}..{}",
            self.ctx,
            region.top(),
            region.bottom()
        );

        let mut cycles = 0u32;
        loop {
            self.tools
                .swipe(&region, self.ctx.swipe_duration, insets)
                .await?;

            if !self.reached_feed_end().await? {
                continue;
            }

            cycles += 1;
            debug!("{} 到达资讯流末尾，第 {} 次刷新", self.ctx, cycles);
            tokio::time::sleep(pause).await;
            // 结尾标记出现后底栏可能还在重绘，等 Discover 出现再点
            self.tools.click(&discover).await?;
            tokio::time::sleep(pause).await;

            if self.ctx.is_cancelled() {
                info!("{} 收到停止信号，资讯流共刷新 {} 次", self.ctx, cycles);
                break;
            }
        }
        Ok(())
    }

    /// 语音搜索按钮作为顶部锚点
    ///
    /// 先立即查找主语言标签，都找不到时等待最后一个（次语言）标签出现
    async fn voice_search_anchor(&self) -> AppResult<Bounds> {
        let labels = &self.config.voice_search_labels;
        let missing = || SessionError::AnchorMissing {
            labels: labels.clone(),
        };
        let Some((last, primary)) = labels.split_last() else {
            return Err(missing().into());
        };

        for label in primary {
            if let Some(bounds) = self.tools.device().find(&Selector::description(label)).await? {
                return Ok(bounds);
            }
        }
        match self.tools.locate(&Selector::description(last)).await {
            Ok(bounds) => Ok(bounds),
            Err(DeviceError::ElementNotFound { .. }) => Err(missing().into()),
            Err(e) => Err(e.into()),
        }
    }

    async fn reached_feed_end(&self) -> DeviceResult<bool> {
        for label in &self.config.feed_end_labels {
            if self.tools.device().exists(&Selector::description(label)).await? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
