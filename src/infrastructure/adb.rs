//! adb 设备 - 基础设施层
//!
//! 持有设备序列号，通过 `adb -s <serial>` 实现 [`Device`] 的全部能力

use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;
use regex::Regex;
use tokio::process::Command;
use tracing::debug;

use crate::error::{DeviceError, DeviceResult};
use crate::infrastructure::device::Device;
use crate::infrastructure::hierarchy::UiHierarchy;
use crate::models::{Bounds, Orientation, Selector};

/// adb 设备
///
/// 职责：
/// - 持有唯一的设备句柄（序列号）
/// - 把能力调用翻译成 adb 命令
/// - 不处理业务流程
pub struct AdbDevice {
    adb_path: String,
    serial: String,
    managed_packages: Vec<String>,
}

impl AdbDevice {
    pub fn new(adb_path: impl Into<String>, serial: impl Into<String>) -> Self {
        Self {
            adb_path: adb_path.into(),
            serial: serial.into(),
            managed_packages: Vec::new(),
        }
    }

    /// 由本程序驱动的应用
    ///
    /// 它们通常是预装的系统应用，不在 `pm list packages -3` 里，停止所有应用时要单独带上
    pub fn with_managed_packages<I, S>(mut self, packages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.managed_packages = packages.into_iter().map(Into::into).collect();
        self
    }

    /// 执行 adb 子命令，返回 stdout
    async fn adb(&self, args: &[&str]) -> DeviceResult<Vec<u8>> {
        debug!("[{}] adb {}", self.serial, args.join(" "));

        let output = Command::new(&self.adb_path)
            .arg("-s")
            .arg(&self.serial)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|source| DeviceError::SpawnFailed {
                serial: self.serial.clone(),
                program: self.adb_path.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(DeviceError::CommandFailed {
                serial: self.serial.clone(),
                command: args.join(" "),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(output.stdout)
    }

    async fn dump_hierarchy(&self) -> DeviceResult<UiHierarchy> {
        let xml = self.adb(&["exec-out", "uiautomator", "dump", "/dev/tty"]).await?;
        Ok(UiHierarchy::parse(&String::from_utf8_lossy(&xml)))
    }

    async fn stoppable_running_packages(&self) -> DeviceResult<Vec<String>> {
        let third_party = self.shell("pm list packages -3").await?;
        let running = self.shell("ps -A -o NAME").await?;
        Ok(select_running_packages(
            &parse_package_list(&third_party),
            &self.managed_packages,
            &running,
        ))
    }
}

#[async_trait]
impl Device for AdbDevice {
    fn serial(&self) -> &str {
        &self.serial
    }

    async fn current_package(&self) -> DeviceResult<Option<String>> {
        let hierarchy = self.dump_hierarchy().await?;
        Ok(hierarchy.root_package().map(str::to_string))
    }

    async fn app_start(&self, package: &str) -> DeviceResult<()> {
        self.shell(&format!(
            "monkey -p {} -c android.intent.category.LAUNCHER 1",
            package
        ))
        .await?;
        Ok(())
    }

    async fn app_stop(&self, package: &str) -> DeviceResult<()> {
        self.shell(&format!("am force-stop {}", package)).await?;
        Ok(())
    }

    async fn app_stop_all(&self) -> DeviceResult<Vec<String>> {
        let packages = self.stoppable_running_packages().await?;
        for package in &packages {
            self.app_stop(package).await?;
        }
        Ok(packages)
    }

    async fn screenshot(&self) -> DeviceResult<DynamicImage> {
        let png = self.adb(&["exec-out", "screencap", "-p"]).await?;
        image::load_from_memory_with_format(&png, image::ImageFormat::Png).map_err(|source| {
            DeviceError::ScreenshotDecodeFailed {
                serial: self.serial.clone(),
                source,
            }
        })
    }

    async fn find(&self, selector: &Selector) -> DeviceResult<Option<Bounds>> {
        let hierarchy = self.dump_hierarchy().await?;
        Ok(hierarchy.find(selector).and_then(|node| node.bounds))
    }

    async fn tap(&self, x: i32, y: i32) -> DeviceResult<()> {
        self.shell(&format!("input tap {} {}", x, y)).await?;
        Ok(())
    }

    async fn swipe_points(&self, points: &[(i32, i32)], duration: Duration) -> DeviceResult<()> {
        if points.len() < 2 {
            return Err(DeviceError::parse_failed(
                &self.serial,
                "swipe path",
                format!("{:?}", points),
            ));
        }
        let segment_ms = (duration.as_millis() / (points.len() as u128 - 1)).max(1);
        for pair in points.windows(2) {
            let ((x1, y1), (x2, y2)) = (pair[0], pair[1]);
            self.shell(&format!(
                "input swipe {} {} {} {} {}",
                x1, y1, x2, y2, segment_ms
            ))
            .await?;
        }
        Ok(())
    }

    async fn display_width(&self) -> DeviceResult<u32> {
        let output = self.shell("wm size").await?;
        parse_display_size(&output)
            .map(|(width, _)| width)
            .ok_or_else(|| DeviceError::parse_failed(&self.serial, "wm size", output))
    }

    async fn set_orientation(&self, orientation: Orientation) -> DeviceResult<()> {
        self.shell("settings put system accelerometer_rotation 0").await?;
        self.shell(&format!(
            "settings put system user_rotation {}",
            orientation.user_rotation()
        ))
        .await?;
        Ok(())
    }

    async fn shell(&self, command: &str) -> DeviceResult<String> {
        let stdout = self.adb(&["shell", command]).await?;
        Ok(String::from_utf8_lossy(&stdout).into_owned())
    }
}

/// 解析 `wm size` 输出，覆盖尺寸优先于物理尺寸
pub fn parse_display_size(output: &str) -> Option<(u32, u32)> {
    static RE: OnceLock<Regex> = OnceLock::new();
    let re = RE.get_or_init(|| {
        Regex::new(r"(Physical|Override) size:\s*(\d+)x(\d+)").expect("valid wm size regex")
    });

    let mut physical = None;
    for caps in re.captures_iter(output) {
        let size = (caps[2].parse().ok()?, caps[3].parse().ok()?);
        if &caps[1] == "Override" {
            return Some(size);
        }
        physical = Some(size);
    }
    physical
}

/// 从 `ps -A -o NAME` 输出中挑出需要停止的应用（按进程列表顺序、去重）
///
/// 第三方应用和本程序驱动的应用都算，系统界面、桌面等不动
pub fn select_running_packages(third_party: &[String], managed: &[String], ps_output: &str) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();
    for name in ps_output.lines().map(str::trim) {
        let stoppable = third_party.iter().chain(managed).any(|package| package == name);
        if stoppable && !selected.iter().any(|package| package == name) {
            selected.push(name.to_string());
        }
    }
    selected
}

/// 解析 `pm list packages` 输出
pub fn parse_package_list(output: &str) -> Vec<String> {
    output
        .lines()
        .filter_map(|line| line.trim().strip_prefix("package:"))
        .filter(|package| !package.is_empty())
        .map(str::to_string)
        .collect()
}
