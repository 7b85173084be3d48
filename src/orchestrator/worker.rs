//! 单设备 worker - 编排层
//!
//! 状态机：`等待解锁 → 运行 → {完成, 取消, 失败}`
//!
//! - 等待解锁：前台是锁屏应用或未知时按固定间隔轮询，每次轮询都检查停止信号
//! - 运行：按模式构造会话并执行一次，不在这一层重试
//! - 无论以何种状态结束，最后都会对设备执行一次"停止所有应用"

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::DeviceResult;
use crate::infrastructure::{Device, OcrEngine};
use crate::models::{ParsingMode, RunOutcome};
use crate::workflow::{Session, SessionCtx};

pub struct Worker {
    ctx: SessionCtx,
    device: Arc<dyn Device>,
    ocr: Arc<dyn OcrEngine>,
    mode: ParsingMode,
    config: Arc<Config>,
}

impl Worker {
    pub fn new(
        ctx: SessionCtx,
        device: Arc<dyn Device>,
        ocr: Arc<dyn OcrEngine>,
        mode: ParsingMode,
        config: Arc<Config>,
    ) -> Self {
        Self {
            ctx,
            device,
            ocr,
            mode,
            config,
        }
    }

    /// 运行到终止状态，并保证执行清理
    pub async fn run(self) -> RunOutcome {
        info!("{} 📱 worker 启动，模式: {}", self.ctx, self.mode);

        let outcome = self.execute().await;
        self.stop_all_apps().await;

        info!("{} 🏁 worker 结束: {}", self.ctx, outcome);
        outcome
    }

    async fn execute(&self) -> RunOutcome {
        match self.wait_unlock().await {
            Ok(true) => {}
            Ok(false) => return RunOutcome::CancelledBeforeStart,
            Err(e) => {
                error!("{} ❌ 查询前台应用失败: {}", self.ctx, e);
                return RunOutcome::Failed;
            }
        }

        if self.ctx.is_cancelled() {
            info!("{} 解锁后收到停止信号，不启动会话", self.ctx);
            return RunOutcome::CancelledBeforeStart;
        }

        let session = Session::for_mode(
            self.mode,
            self.ctx.clone(),
            self.device.clone(),
            self.ocr.clone(),
            &self.config,
        );

        match AssertUnwindSafe(session.run()).catch_unwind().await {
            Ok(Ok(())) if self.ctx.is_cancelled() => RunOutcome::CancelledDuringRun,
            Ok(Ok(())) => RunOutcome::Completed,
            Ok(Err(e)) => {
                error!("{} ❌ 会话失败: {}", self.ctx, e);
                RunOutcome::Failed
            }
            Err(panic) => {
                error!("{} ❌ 会话崩溃: {}", self.ctx, panic_message(panic.as_ref()));
                RunOutcome::Failed
            }
        }
    }

    /// 等待设备离开锁屏
    ///
    /// 只有读到一个不是锁屏应用的包名才算解锁。
    /// 读不到包名（界面层级为空）时继续等待；
    /// 连续查询失败达到 `unlock_error_tolerance` 次才返回错误。
    ///
    /// 返回 `false` 表示等待期间收到了停止信号
    async fn wait_unlock(&self) -> DeviceResult<bool> {
        let interval = self.config.unlock_poll_interval();
        let tolerance = self.config.unlock_error_tolerance;
        let mut announced = false;
        let mut failures = 0u32;

        loop {
            if self.ctx.is_cancelled() {
                info!("{} 等待解锁时收到停止信号", self.ctx);
                return Ok(false);
            }

            match self.device.current_package().await {
                Ok(Some(package)) if package != self.config.lock_screen_package => return Ok(true),
                Ok(Some(_)) => {
                    failures = 0;
                    if !announced {
                        info!("{} 🔒 设备处于锁屏状态，等待解锁...", self.ctx);
                        announced = true;
                    }
                }
                Ok(None) => {
                    failures = 0;
                    debug!("{} 前台应用未知，继续等待", self.ctx);
                }
                Err(e) => {
                    failures += 1;
                    if failures >= tolerance {
                        return Err(e);
                    }
                    warn!(
                        "{} ⚠️ 查询前台应用失败 ({}/{}): {}",
                        self.ctx, failures, tolerance, e
                    );
                }
            }
            sleep(interval).await;
        }
    }

    async fn stop_all_apps(&self) {
        match self.device.app_stop_all().await {
            Ok(stopped) if !stopped.is_empty() => {
                info!("{} 已停止 {} 个应用: {}", self.ctx, stopped.len(), stopped.join(", "));
            }
            Ok(_) => {}
            Err(e) => warn!("{} ⚠️ 停止应用失败: {}", self.ctx, e),
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
