//! 滑动手势服务 - 业务能力层
//!
//! 在两个锚点之间的竖直区域内，沿屏幕中线从下往上滑动一次

use std::sync::Arc;
use std::time::Duration;

use crate::error::{DeviceResult, SessionError};
use crate::infrastructure::Device;
use crate::models::Bounds;

/// 可滑动的竖直区域
///
/// 只能通过锚点计算得到，保证 `top < bottom`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenRegion {
    top: i32,
    bottom: i32,
}

impl ScreenRegion {
    pub fn new(top: i32, bottom: i32) -> Result<Self, SessionError> {
        if top >= bottom {
            return Err(SessionError::InvalidRegion { top, bottom });
        }
        Ok(Self { top, bottom })
    }

    /// 顶部锚点的下边缘 → 底部锚点的 `bottom_edge`
    pub fn between(top_anchor: Bounds, bottom_edge: i32) -> Result<Self, SessionError> {
        Self::new(top_anchor.bottom, bottom_edge)
    }

    pub fn top(&self) -> i32 {
        self.top
    }

    pub fn bottom(&self) -> i32 {
        self.bottom
    }
}

/// 滑动起止点相对区域边界的内缩
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwipeInsets {
    pub top: i32,
    pub bottom: i32,
}

impl Default for SwipeInsets {
    fn default() -> Self {
        Self { top: 25, bottom: 25 }
    }
}

impl SwipeInsets {
    pub fn with_bottom(bottom: i32) -> Self {
        Self {
            bottom,
            ..Default::default()
        }
    }
}

/// 计算滑动路径：从 `(中线, bottom - 下内缩)` 到 `(中线, top + 上内缩)`
pub fn swipe_path(display_width: u32, region: &ScreenRegion, insets: SwipeInsets) -> [(i32, i32); 2] {
    let center_x = (f64::from(display_width) / 2.0).round_ties_even() as i32;
    [
        (center_x, region.bottom - insets.bottom),
        (center_x, region.top + insets.top),
    ]
}

/// 滑动手势驱动
pub struct GestureDriver {
    device: Arc<dyn Device>,
}

impl GestureDriver {
    pub fn new(device: Arc<dyn Device>) -> Self {
        Self { device }
    }

    /// 在区域内执行一次上滑
    pub async fn swipe(
        &self,
        region: &ScreenRegion,
        duration: Duration,
        insets: SwipeInsets,
    ) -> DeviceResult<()> {
        let width = self.device.display_width().await?;
        let path = swipe_path(width, region, insets);
        self.device.swipe_points(&path, duration).await
    }
}
