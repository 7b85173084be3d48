//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责多设备调度和生命周期管理，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 发现设备，创建 adb 设备句柄和 OCR 引擎
//! - 把 Ctrl-C 接到调度器的中断信号上
//! - 输出全局统计信息
//!
//! ### `supervisor` - 多设备调度器
//! - 前置检查（设备列表、链接文件）
//! - 每台设备一个 tokio 任务
//! - 持有唯一的停止信号（CancellationToken）
//! - 中断后先等宽限时间，再强制终止
//!
//! ### `worker` - 单设备状态机
//! - 等待解锁
//! - 构造并执行一次会话
//! - 无论结果如何都停止设备上的所有应用
//!
//! ## 层次关系
//!
//! ```text
//! app (发现设备)
//!     ↓
//! supervisor (处理 Vec<Device>)
//!     ↓
//! worker (处理单台设备)
//!     ↓
//! workflow::Session (一次完整的滚动流程)
//!     ↓
//! services (能力层：classifier / gesture / link queue)
//!     ↓
//! infrastructure (基础设施：adb / tesseract)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：supervisor 管多设备，worker 管单台设备
//! 2. **资源隔离**：每个设备句柄只属于一个 worker
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体滚动判断

pub mod app;
pub mod supervisor;
pub mod worker;

// 重新导出主要类型
pub use app::App;
pub use supervisor::{Orchestrator, ShutdownReport, WorkerExit, WorkerReport};
pub use worker::Worker;
