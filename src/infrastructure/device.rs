//! 设备能力抽象 - 基础设施层
//!
//! 会话和 worker 只依赖 [`Device`] trait，不关心底层是 adb 还是别的传输

use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use tokio::time::{sleep, Instant};

use crate::error::{DeviceError, DeviceResult};
use crate::models::{Bounds, Orientation, Selector};

/// 一台 Android 设备
///
/// 职责：
/// - 只暴露输入模拟、截图、元素查询等能力
/// - 不认识会话 / 分类 / 链接
#[async_trait]
pub trait Device: Send + Sync {
    /// 设备序列号
    fn serial(&self) -> &str;

    /// 当前前台应用包名
    async fn current_package(&self) -> DeviceResult<Option<String>>;

    async fn app_start(&self, package: &str) -> DeviceResult<()>;

    async fn app_stop(&self, package: &str) -> DeviceResult<()>;

    /// 停止所有正在运行的应用，返回被停止的包名
    async fn app_stop_all(&self) -> DeviceResult<Vec<String>>;

    async fn screenshot(&self) -> DeviceResult<DynamicImage>;

    /// 查找元素，不存在时返回 `None`（不等待）
    async fn find(&self, selector: &Selector) -> DeviceResult<Option<Bounds>>;

    async fn tap(&self, x: i32, y: i32) -> DeviceResult<()>;

    /// 沿多个点滑动，总时长为 `duration`
    async fn swipe_points(&self, points: &[(i32, i32)], duration: Duration) -> DeviceResult<()>;

    /// 屏幕宽度（像素）
    async fn display_width(&self) -> DeviceResult<u32>;

    async fn set_orientation(&self, orientation: Orientation) -> DeviceResult<()>;

    /// 执行原始 shell 命令
    async fn shell(&self, command: &str) -> DeviceResult<String>;

    async fn exists(&self, selector: &Selector) -> DeviceResult<bool> {
        Ok(self.find(selector).await?.is_some())
    }

    /// 点击元素中心
    async fn click(&self, selector: &Selector) -> DeviceResult<()> {
        let bounds = self
            .find(selector)
            .await?
            .ok_or_else(|| DeviceError::element_not_found(self.serial(), selector))?;
        let (x, y) = bounds.center();
        self.tap(x, y).await
    }
}

/// 等待元素出现
///
/// 页面切换后元素可能尚未渲染，锚点查询统一走这里
pub async fn wait_for_element(
    device: &dyn Device,
    selector: &Selector,
    timeout: Duration,
    interval: Duration,
) -> DeviceResult<Bounds> {
    let deadline = Instant::now() + timeout;
    loop {
        if let Some(bounds) = device.find(selector).await? {
            return Ok(bounds);
        }
        if Instant::now() >= deadline {
            return Err(DeviceError::element_not_found(device.serial(), selector));
        }
        sleep(interval).await;
    }
}
