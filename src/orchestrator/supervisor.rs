//! 多设备调度 - 编排层
//!
//! ## 职责
//!
//! 1. **前置检查**：没有设备、links 模式缺少链接文件时直接失败，不启动任何 worker
//! 2. **并发启动**：每台设备一个独立的 tokio 任务
//! 3. **正常等待**：不设超时，按完成顺序 join
//! 4. **中断处理**：设置停止信号，所有 worker 共用一段宽限时间，到期仍未结束的强制终止
//! 5. **致命错误**：任一 worker 任务在自身保护范围之外崩溃时，立即终止其余任务，等它们退出后返回错误
//!
//! worker 之间只共享一个 [`CancellationToken`]。

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::{BoxFuture, FutureExt};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::task::{AbortHandle, JoinError};
use tokio::time::{timeout_at, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, OrchestrationError};
use crate::infrastructure::{Device, OcrEngine};
use crate::models::{ParsingMode, RunOutcome};
use crate::orchestrator::worker::Worker;
use crate::workflow::SessionCtx;

/// worker 的退出方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerExit {
    /// 自行结束（含宽限期内结束）
    Finished(RunOutcome),
    /// 宽限期后被强制终止
    ForceTerminated,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerReport {
    pub serial: String,
    pub exit: WorkerExit,
}

/// 一次运行的结束报告
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShutdownReport {
    /// 是否因外部中断而结束
    pub interrupted: bool,
    pub workers: Vec<WorkerReport>,
}

impl ShutdownReport {
    pub fn count(&self, outcome: RunOutcome) -> usize {
        self.workers
            .iter()
            .filter(|w| w.exit == WorkerExit::Finished(outcome))
            .count()
    }

    pub fn force_terminated(&self) -> usize {
        self.workers
            .iter()
            .filter(|w| w.exit == WorkerExit::ForceTerminated)
            .count()
    }
}

/// 一个 worker 的登记信息，按设备顺序存放
struct WorkerSlot {
    serial: String,
    abort: AbortHandle,
    exit: Option<WorkerExit>,
}

/// 按完成顺序产出 `(槽位, join 结果)`
type Joined = (usize, Result<RunOutcome, JoinError>);
type PendingJoins = FuturesUnordered<BoxFuture<'static, Joined>>;

/// 多设备调度器
pub struct Orchestrator {
    config: Arc<Config>,
    ocr: Arc<dyn OcrEngine>,
}

impl Orchestrator {
    pub fn new(config: Arc<Config>, ocr: Arc<dyn OcrEngine>) -> Self {
        Self { config, ocr }
    }

    /// 在所有设备上运行，直到全部结束或 `shutdown` 完成
    pub async fn run<F>(
        &self,
        devices: Vec<Arc<dyn Device>>,
        swipe_duration: Duration,
        mode: ParsingMode,
        shutdown: F,
    ) -> AppResult<ShutdownReport>
    where
        F: Future<Output = ()>,
    {
        self.check_preconditions(&devices, mode)?;

        let cancel = CancellationToken::new();
        let (mut workers, mut pending) = self.spawn_workers(devices, swipe_duration, mode, &cancel);
        info!("🚀 已启动 {} 个 worker", workers.len());

        tokio::pin!(shutdown);
        let mut interrupted = false;

        // 按完成顺序收集，任何一个崩溃都能立刻发现
        loop {
            let (idx, joined) = tokio::select! {
                next = pending.next() => match next {
                    Some(joined) => joined,
                    None => break,
                },
                _ = &mut shutdown => {
                    interrupted = true;
                    break;
                }
            };
            settle(&cancel, &mut workers, &mut pending, idx, joined).await?;
        }

        if interrupted {
            self.graceful_shutdown(&cancel, &mut workers, &mut pending).await?;
        }

        Ok(ShutdownReport {
            interrupted,
            workers: workers
                .into_iter()
                .map(|w| WorkerReport {
                    serial: w.serial,
                    exit: w.exit.unwrap_or(WorkerExit::ForceTerminated),
                })
                .collect(),
        })
    }

    fn check_preconditions(&self, devices: &[Arc<dyn Device>], mode: ParsingMode) -> AppResult<()> {
        if devices.is_empty() {
            return Err(OrchestrationError::NoDevices.into());
        }
        if mode.requires_links_file() && !self.config.links_file.is_file() {
            return Err(OrchestrationError::LinksFileMissing {
                path: self.config.links_file.clone(),
            }
            .into());
        }
        Ok(())
    }

    fn spawn_workers(
        &self,
        devices: Vec<Arc<dyn Device>>,
        swipe_duration: Duration,
        mode: ParsingMode,
        cancel: &CancellationToken,
    ) -> (Vec<WorkerSlot>, PendingJoins) {
        let pending = FuturesUnordered::new();
        let workers = devices
            .into_iter()
            .enumerate()
            .map(|(idx, device)| {
                let serial = device.serial().to_string();
                let ctx = SessionCtx::new(serial.clone(), swipe_duration, cancel.clone());
                let worker = Worker::new(ctx, device, self.ocr.clone(), mode, self.config.clone());
                let handle = tokio::spawn(worker.run());
                let abort = handle.abort_handle();
                pending.push(handle.map(move |joined| (idx, joined)).boxed());
                WorkerSlot {
                    serial,
                    abort,
                    exit: None,
                }
            })
            .collect();
        (workers, pending)
    }

    /// 通知停止，所有 worker 共用一个宽限截止时间，到期未结束的强制终止
    async fn graceful_shutdown(
        &self,
        cancel: &CancellationToken,
        workers: &mut [WorkerSlot],
        pending: &mut PendingJoins,
    ) -> AppResult<()> {
        let grace = self.config.shutdown_grace();
        warn!("🛑 收到中断信号，通知所有设备停止（宽限 {:?}）", grace);
        cancel.cancel();
        let deadline = Instant::now() + grace;

        loop {
            match timeout_at(deadline, pending.next()).await {
                Ok(Some((idx, joined))) => settle(cancel, workers, pending, idx, joined).await?,
                Ok(None) => return Ok(()),
                Err(_) => {
                    for worker in workers.iter().filter(|w| w.exit.is_none()) {
                        warn!("[设备 {}] ⏱ 宽限期内未结束，强制终止", worker.serial);
                    }
                    terminate_remaining(workers, pending).await;
                    return Ok(());
                }
            }
        }
    }
}

/// 登记一个已结束的 worker；崩溃时终止其余 worker 并返回错误
async fn settle(
    cancel: &CancellationToken,
    workers: &mut [WorkerSlot],
    pending: &mut PendingJoins,
    idx: usize,
    joined: Result<RunOutcome, JoinError>,
) -> AppResult<()> {
    match finished(&workers[idx].serial, joined) {
        Ok(exit) => {
            workers[idx].exit = Some(exit);
            Ok(())
        }
        Err(e) => {
            cancel.cancel();
            terminate_remaining(workers, pending).await;
            Err(e)
        }
    }
}

fn finished(serial: &str, joined: Result<RunOutcome, JoinError>) -> Result<WorkerExit, AppError> {
    joined.map(WorkerExit::Finished).map_err(|e| {
        error!("[设备 {}] 💥 worker 任务崩溃: {}", serial, e);
        OrchestrationError::WorkerCrashed {
            serial: serial.to_string(),
            reason: e.to_string(),
        }
        .into()
    })
}

/// 强制终止所有未结束的 worker，并等它们真正退出
///
/// 返回时每个任务都已被 join，持有的设备句柄已释放
async fn terminate_remaining(workers: &mut [WorkerSlot], pending: &mut PendingJoins) {
    for worker in workers.iter().filter(|w| w.exit.is_none()) {
        worker.abort.abort();
    }
    while let Some((idx, joined)) = pending.next().await {
        workers[idx].exit = Some(match joined {
            Ok(outcome) => WorkerExit::Finished(outcome),
            Err(_) => WorkerExit::ForceTerminated,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::fake::{Call, FakeDevice, FakeOcr};
    use crate::models::{Bounds, Selector};
    use std::future::pending;
    use tokio::time::{sleep, Instant};

    fn orchestrator(config: Config, screen_of: &FakeDevice) -> Orchestrator {
        let ocr = Arc::new(FakeOcr::new(screen_of.screen()));
        Orchestrator::new(Arc::new(config), ocr)
    }

    fn as_devices(devices: &[Arc<FakeDevice>]) -> Vec<Arc<dyn Device>> {
        devices.iter().map(|d| d.clone() as Arc<dyn Device>).collect()
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_devices_complete_recommendations() {
        let devices = vec![
            Arc::new(FakeDevice::new("A1").with_default_anchors()),
            Arc::new(FakeDevice::new("B2").with_default_anchors()),
        ];
        let orch = orchestrator(Config::default(), &devices[0]);

        let report = orch
            .run(
                as_devices(&devices),
                Duration::from_millis(500),
                ParsingMode::Recommendations,
                pending(),
            )
            .await
            .unwrap();

        assert!(!report.interrupted);
        assert_eq!(report.count(RunOutcome::Completed), 2);
        for device in &devices {
            assert_eq!(device.swipes().len(), 45);
            assert_eq!(device.count(|c| *c == Call::AppStopAll), 1);
            assert_eq!(
                device.count(|c| *c == Call::AppStop("com.google.android.youtube".into())),
                1
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_links_file_spawns_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let device = Arc::new(FakeDevice::new("A1").with_default_anchors());
        let config = Config {
            links_file: dir.path().join("links.txt"),
            ..Config::default()
        };
        let orch = orchestrator(config, &device);

        let result = orch
            .run(
                as_devices(&[device.clone()]),
                Duration::from_millis(500),
                ParsingMode::Links,
                pending(),
            )
            .await;

        assert!(matches!(
            result,
            Err(AppError::Orchestration(OrchestrationError::LinksFileMissing { .. }))
        ));
        assert!(device.calls().is_empty());
    }

    #[tokio::test]
    async fn test_no_devices() {
        let probe = FakeDevice::new("none");
        let orch = orchestrator(Config::default(), &probe);

        let result = orch
            .run(Vec::new(), Duration::from_millis(500), ParsingMode::Google, pending())
            .await;

        assert!(matches!(
            result,
            Err(AppError::Orchestration(OrchestrationError::NoDevices))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_force_terminates_stuck_worker() {
        let device = Arc::new(
            FakeDevice::new("A1")
                .with_default_anchors()
                .with_swipe_delay(Duration::from_secs(60)),
        );
        let orch = orchestrator(Config::default(), &device);
        let start = Instant::now();

        let report = orch
            .run(
                as_devices(&[device.clone()]),
                Duration::from_millis(500),
                ParsingMode::Recommendations,
                sleep(Duration::from_secs(1)),
            )
            .await
            .unwrap();

        assert!(report.interrupted);
        assert_eq!(report.force_terminated(), 1);
        // 1s 后中断 + 5s 宽限
        assert!(start.elapsed() <= Duration::from_secs(6) + Duration::from_millis(100));
        assert!(device.swipes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_lets_cooperative_worker_finish() {
        let device = Arc::new(
            FakeDevice::new("A1")
                .with_default_anchors()
                .with_element(Selector::description("Voice search"), Bounds::new(900, 150, 1000, 250))
                .with_element_after_swipes(
                    Selector::description("More stories"),
                    Bounds::new(300, 1800, 780, 1900),
                    2,
                ),
        );
        let mut config = Config::default();
        config.google.feed_end_pause_ms = 1000;
        let orch = orchestrator(config, &device);

        let report = orch
            .run(
                as_devices(&[device.clone()]),
                Duration::from_millis(500),
                ParsingMode::Google,
                sleep(Duration::from_millis(500)),
            )
            .await
            .unwrap();

        assert!(report.interrupted);
        assert_eq!(
            report.workers,
            vec![WorkerReport {
                serial: "A1".to_string(),
                exit: WorkerExit::Finished(RunOutcome::CancelledDuringRun),
            }]
        );
        assert_eq!(device.count(|c| *c == Call::AppStopAll), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_worker_crash_outside_guard_is_fatal() {
        let devices = vec![
            Arc::new(FakeDevice::new("A1").panicking_on_stop_all()),
            Arc::new(
                FakeDevice::new("B2")
                    .with_default_anchors()
                    .with_swipe_delay(Duration::from_secs(60)),
            ),
        ];
        let orch = orchestrator(Config::default(), &devices[0]);

        let result = orch
            .run(
                as_devices(&devices),
                Duration::from_millis(500),
                ParsingMode::Recommendations,
                pending(),
            )
            .await;

        assert!(matches!(
            result,
            Err(AppError::Orchestration(OrchestrationError::WorkerCrashed { ref serial, .. })) if serial == "A1"
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_crash_in_later_slot_is_detected_immediately() {
        let devices = vec![
            Arc::new(
                FakeDevice::new("A1")
                    .with_default_anchors()
                    .with_swipe_delay(Duration::from_secs(60)),
            ),
            Arc::new(FakeDevice::new("B2").failing_app_start().panicking_on_stop_all()),
        ];
        let orch = orchestrator(Config::default(), &devices[0]);
        let start = Instant::now();

        let result = orch
            .run(
                as_devices(&devices),
                Duration::from_millis(500),
                ParsingMode::Recommendations,
                pending(),
            )
            .await;

        assert!(matches!(
            result,
            Err(AppError::Orchestration(OrchestrationError::WorkerCrashed { ref serial, .. })) if serial == "B2"
        ));
        assert!(start.elapsed() < Duration::from_secs(5));
        assert!(devices[0].swipes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_fatal_crash_joins_aborted_workers_before_returning() {
        let devices = vec![
            Arc::new(FakeDevice::new("A1").panicking_on_stop_all()),
            Arc::new(
                FakeDevice::new("B2")
                    .with_default_anchors()
                    .with_swipe_delay(Duration::from_secs(60)),
            ),
        ];
        let orch = orchestrator(Config::default(), &devices[0]);

        let result = orch
            .run(
                as_devices(&devices),
                Duration::from_millis(500),
                ParsingMode::Recommendations,
                pending(),
            )
            .await;

        assert!(result.is_err());
        // 被终止的任务已经退出，不再持有设备
        assert_eq!(Arc::strong_count(&devices[1]), 1);
        assert!(devices[1].swipes().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_grace_period_is_shared_by_all_workers() {
        let devices: Vec<_> = ["A1", "B2", "C3"]
            .into_iter()
            .map(|serial| {
                Arc::new(
                    FakeDevice::new(serial)
                        .with_default_anchors()
                        .with_swipe_delay(Duration::from_secs(60)),
                )
            })
            .collect();
        let orch = orchestrator(Config::default(), &devices[0]);
        let start = Instant::now();

        let report = orch
            .run(
                as_devices(&devices),
                Duration::from_millis(500),
                ParsingMode::Recommendations,
                sleep(Duration::from_secs(1)),
            )
            .await
            .unwrap();

        assert_eq!(report.force_terminated(), 3);
        // 1s 后中断 + 一次 5s 宽限，而不是每台设备各 5s
        assert!(start.elapsed() <= Duration::from_secs(6) + Duration::from_millis(100));
        for device in &devices {
            assert_eq!(Arc::strong_count(device), 1);
        }
    }
}
