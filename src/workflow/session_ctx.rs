//! 会话上下文
//!
//! 封装"我正在哪台设备上、以什么速度滑动、是否该停下"这一信息

use std::fmt::Display;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// 会话上下文
#[derive(Debug, Clone)]
pub struct SessionCtx {
    /// 设备序列号
    pub serial: String,

    /// 单次滑动动画时长
    pub swipe_duration: Duration,

    /// 全局停止信号（所有 worker 共享）
    pub cancel: CancellationToken,
}

impl SessionCtx {
    pub fn new(serial: impl Into<String>, swipe_duration: Duration, cancel: CancellationToken) -> Self {
        Self {
            serial: serial.into(),
            swipe_duration,
            cancel,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl Display for SessionCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[设备 {}]", self.serial)
    }
}
