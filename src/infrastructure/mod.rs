//! 基础设施层
//!
//! 持有稀缺资源（设备句柄、OCR 进程），只暴露能力

pub mod adb;
pub mod device;
pub mod discovery;
pub mod hierarchy;
pub mod ocr;

#[cfg(test)]
pub mod fake;

pub use adb::AdbDevice;
pub use device::{wait_for_element, Device};
pub use discovery::list_device_serials;
pub use ocr::{OcrEngine, OcrOutput, OcrToken, TesseractOcr};
