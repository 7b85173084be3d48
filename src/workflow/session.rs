//! 会话 - 流程层
//!
//! 一个会话 = 一台设备上一次完整的自动化流程。
//! 模式在 worker 构造时分派一次，之后只通过 [`Session`] 枚举调用。
//!
//! 流程顺序：
//! 1. 启动目标应用，固定屏幕方向
//! 2. 执行模式对应的滚动流程（出错只记录，不向上传播）
//! 3. 停止目标应用（任何情况下都会执行）

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::config::Config;
use crate::error::{AppResult, DeviceResult};
use crate::infrastructure::{wait_for_element, Device, OcrEngine};
use crate::models::{Bounds, Orientation, ParsingMode, Selector};
use crate::services::{GestureDriver, ScreenClassifier, ScreenRegion, SwipeInsets};
use crate::workflow::link_replay::LinkReplaySession;
use crate::workflow::news_feed::NewsFeedSession;
use crate::workflow::session_ctx::SessionCtx;
use crate::workflow::video_feed::VideoFeedSession;

/// 按模式区分的会话
pub enum Session {
    /// 视频应用首页推荐
    VideoFeed(VideoFeedSession),
    /// 搜索应用资讯流
    NewsFeed(NewsFeedSession),
    /// 视频链接回放
    LinkReplay(LinkReplaySession),
}

impl Session {
    /// 根据解析模式构造会话
    pub fn for_mode(
        mode: ParsingMode,
        ctx: SessionCtx,
        device: Arc<dyn Device>,
        ocr: Arc<dyn OcrEngine>,
        config: &Config,
    ) -> Self {
        let tools = SessionTools::new(device, config);
        match mode {
            ParsingMode::Recommendations => {
                Session::VideoFeed(VideoFeedSession::new(ctx, tools, config.youtube.clone()))
            }
            ParsingMode::Google => {
                Session::NewsFeed(NewsFeedSession::new(ctx, tools, config.google.clone()))
            }
            ParsingMode::Links => Session::LinkReplay(LinkReplaySession::new(
                ctx,
                tools,
                ScreenClassifier::new(ocr, config),
                config.youtube.clone(),
                config.links_file.clone(),
            )),
        }
    }

    /// 目标应用包名
    pub fn package(&self) -> &str {
        match self {
            Session::VideoFeed(s) => &s.config.package,
            Session::NewsFeed(s) => &s.config.package,
            Session::LinkReplay(s) => &s.config.package,
        }
    }

    fn ctx(&self) -> &SessionCtx {
        match self {
            Session::VideoFeed(s) => &s.ctx,
            Session::NewsFeed(s) => &s.ctx,
            Session::LinkReplay(s) => &s.ctx,
        }
    }

    fn tools(&self) -> &SessionTools {
        match self {
            Session::VideoFeed(s) => &s.tools,
            Session::NewsFeed(s) => &s.tools,
            Session::LinkReplay(s) => &s.tools,
        }
    }

    /// 执行一次完整会话
    ///
    /// 只有启动或停止应用失败才返回错误
    pub async fn run(&self) -> AppResult<()> {
        let ctx = self.ctx();
        let device = self.tools().device();
        let package = self.package();

        info!("{} 🚀 启动应用 {}", ctx, package);
        device.app_start(package).await?;

        if let Err(e) = self.drive().await {
            error!("{} ❌ 会话执行出错: {}", ctx, e);
        }

        device.app_stop(package).await?;
        info!("{} 已停止应用 {}", ctx, package);
        Ok(())
    }

    async fn drive(&self) -> AppResult<()> {
        self.tools().device().set_orientation(Orientation::Natural).await?;
        match self {
            Session::VideoFeed(s) => s.scroll().await,
            Session::NewsFeed(s) => s.scroll().await,
            Session::LinkReplay(s) => s.replay().await.map(|_| ()),
        }
    }
}

/// 会话共用的设备操作
///
/// 锚点查询都带等待，页面切换后元素可能还没渲染出来
pub struct SessionTools {
    device: Arc<dyn Device>,
    gesture: GestureDriver,
    element_wait: Duration,
    element_poll: Duration,
}

impl SessionTools {
    pub fn new(device: Arc<dyn Device>, config: &Config) -> Self {
        Self {
            gesture: GestureDriver::new(device.clone()),
            device,
            element_wait: Duration::from_millis(config.element_wait_ms),
            element_poll: Duration::from_millis(config.element_poll_ms),
        }
    }

    pub fn device(&self) -> &dyn Device {
        self.device.as_ref()
    }

    /// 等待元素出现并返回其边界
    pub async fn locate(&self, selector: &Selector) -> DeviceResult<Bounds> {
        wait_for_element(
            self.device.as_ref(),
            selector,
            self.element_wait,
            self.element_poll,
        )
        .await
    }

    /// 等待元素出现后点击其中心
    pub async fn click(&self, selector: &Selector) -> DeviceResult<Bounds> {
        let bounds = self.locate(selector).await?;
        let (x, y) = bounds.center();
        self.device.tap(x, y).await?;
        Ok(bounds)
    }

    /// 连续滑动固定次数，中途不响应停止信号
    pub async fn swipe_times(
        &self,
        region: &ScreenRegion,
        times: u32,
        duration: Duration,
        insets: SwipeInsets,
    ) -> DeviceResult<()> {
        for _ in 0..times {
            self.gesture.swipe(region, duration, insets).await?;
        }
        Ok(())
    }

    pub async fn swipe(&self, region: &ScreenRegion, duration: Duration, insets: SwipeInsets) -> DeviceResult<()> {
        self.gesture.swipe(region, duration, insets).await
    }
}
