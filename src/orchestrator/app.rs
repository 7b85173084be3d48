//! 应用入口 - 编排层
//!
//! 发现设备 → 构造 adb 设备和 tesseract OCR → 交给 [`Orchestrator`] 运行，
//! Ctrl-C 作为中断信号。

use std::future::pending;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::Config;
use crate::error::AppResult;
use crate::infrastructure::{list_device_serials, AdbDevice, Device, TesseractOcr};
use crate::models::ParsingMode;
use crate::orchestrator::supervisor::{Orchestrator, ShutdownReport};
use crate::utils::logging::{log_devices_found, log_startup, print_final_stats};

/// 应用主结构
pub struct App {
    config: Arc<Config>,
}

impl App {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    /// 运行应用主逻辑
    pub async fn run(&self, swipe_duration: Duration, mode: ParsingMode) -> AppResult<ShutdownReport> {
        log_startup(mode, swipe_duration);

        info!("\n🔍 正在查找已连接的设备...");
        let serials = list_device_serials(&self.config.adb_path).await?;
        log_devices_found(&serials);

        let managed = [&self.config.youtube.package, &self.config.google.package];
        let devices: Vec<Arc<dyn Device>> = serials
            .into_iter()
            .map(|serial| {
                let device = AdbDevice::new(&self.config.adb_path, serial)
                    .with_managed_packages(managed.iter().map(|package| package.to_string()));
                Arc::new(device) as Arc<dyn Device>
            })
            .collect();
        let ocr = Arc::new(TesseractOcr::new(&self.config.tesseract_path));

        let orchestrator = Orchestrator::new(self.config.clone(), ocr);
        let report = orchestrator
            .run(devices, swipe_duration, mode, interrupt_signal())
            .await?;

        print_final_stats(&report);
        Ok(report)
    }
}

/// 等待 Ctrl-C
///
/// 信号监听注册失败时永不返回，程序按正常流程等所有 worker 结束
async fn interrupt_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("\n⌨️ 收到 Ctrl-C"),
        Err(e) => {
            warn!("⚠️ 无法监听 Ctrl-C: {}", e);
            pending::<()>().await;
        }
    }
}
