//! # Feed Scroller
//!
//! 多台 Android 设备并发自动滚动视频推荐、资讯流和视频链接
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（设备、OCR 进程），只暴露能力
//! - `AdbDevice` - 基于 adb 的设备句柄，实现 `Device` trait
//! - `TesseractOcr` - 基于 tesseract 命令行的 OCR，实现 `OcrEngine` trait
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `ScreenClassifier` - 截图 → OCR → 判断当前屏幕内容类型
//! - `GestureDriver` - 在锚点区域内上滑
//! - `LinkQueue` - 链接文件读取与赞助链接重试
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一台设备上一次会话"的完整流程
//! - `SessionCtx` - 上下文封装（设备序列号 + 滑动时长 + 停止信号）
//! - `Session` - 按模式分派：推荐页 / 资讯流 / 链接回放
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/supervisor` - 多设备调度器，管理并发和停止信号
//! - `orchestrator/worker` - 单设备状态机，保证应用最终被停止
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{AdbDevice, Device, OcrEngine, TesseractOcr};
pub use models::{ContentCategory, ParsingMode, RunOutcome};
pub use orchestrator::{App, Orchestrator, ShutdownReport};
pub use workflow::{Session, SessionCtx};
