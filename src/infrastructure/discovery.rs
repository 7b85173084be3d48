//! 设备发现

use std::process::Stdio;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{DeviceError, DeviceResult};

/// 列出所有已连接且可用（状态为 `device`）的设备序列号
pub async fn list_device_serials(adb_path: &str) -> DeviceResult<Vec<String>> {
    let output = Command::new(adb_path)
        .arg("devices")
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|source| DeviceError::SpawnFailed {
            serial: "-".to_string(),
            program: adb_path.to_string(),
            source,
        })?;

    if !output.status.success() {
        return Err(DeviceError::CommandFailed {
            serial: "-".to_string(),
            command: "devices".to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    debug!("adb devices 输出:\n{}", stdout);
    Ok(parse_device_list(&stdout))
}

/// 解析 `adb devices` 输出
pub fn parse_device_list(output: &str) -> Vec<String> {
    let mut serials = Vec::new();
    for line in output.lines().skip_while(|line| !line.starts_with("List of devices")).skip(1) {
        let mut columns = line.split_whitespace();
        let (Some(serial), Some(state)) = (columns.next(), columns.next()) else {
            continue;
        };
        if state == "device" {
            serials.push(serial.to_string());
        } else {
            warn!("跳过设备 {} (状态: {})", serial, state);
        }
    }
    serials
}
