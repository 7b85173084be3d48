use std::path::PathBuf;

use thiserror::Error;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 设备相关错误
    #[error("设备错误: {0}")]
    Device(#[from] DeviceError),
    /// OCR 识别错误
    #[error("OCR错误: {0}")]
    Ocr(#[from] OcrError),
    /// 文件操作错误
    #[error("文件错误: {0}")]
    File(#[from] FileError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 会话流程错误
    #[error("会话错误: {0}")]
    Session(#[from] SessionError),
    /// 编排层错误
    #[error("编排错误: {0}")]
    Orchestration(#[from] OrchestrationError),
}

/// 设备相关错误
#[derive(Debug, Error)]
pub enum DeviceError {
    /// 无法启动 adb 进程
    #[error("[{serial}] 无法执行 {program}: {source}")]
    SpawnFailed {
        serial: String,
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// adb 命令返回非零状态
    #[error("[{serial}] 命令 `{command}` 执行失败: {stderr}")]
    CommandFailed {
        serial: String,
        command: String,
        stderr: String,
    },
    /// 找不到界面元素
    #[error("[{serial}] 未找到界面元素: {selector}")]
    ElementNotFound { serial: String, selector: String },
    /// 设备输出无法解析
    #[error("[{serial}] 无法解析 {what}: {output}")]
    ParseFailed {
        serial: String,
        what: &'static str,
        output: String,
    },
    /// 截图解码失败
    #[error("[{serial}] 截图解码失败: {source}")]
    ScreenshotDecodeFailed {
        serial: String,
        #[source]
        source: image::ImageError,
    },
}

/// OCR 识别错误
#[derive(Debug, Error)]
pub enum OcrError {
    /// 无法启动 OCR 进程
    #[error("无法启动 {program}: {source}")]
    SpawnFailed {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// OCR 进程返回错误
    #[error("OCR 进程失败 (状态: {status}): {stderr}")]
    ProcessFailed { status: String, stderr: String },
    /// 图片编码失败
    #[error("图片编码失败: {0}")]
    EncodeFailed(#[from] image::ImageError),
}

/// 文件操作错误
#[derive(Debug, Error)]
pub enum FileError {
    /// 文件不存在
    #[error("文件不存在: {}", path.display())]
    NotFound { path: PathBuf },
    /// 读取文件失败
    #[error("读取文件失败 ({}): {source}", path.display())]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: &'static str,
    },
    /// TOML 解析失败
    #[error("TOML解析失败 ({}): {source}", path.display())]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 参数取值非法
    #[error("参数 {name} 取值非法: {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

/// 会话流程错误
#[derive(Debug, Error)]
pub enum SessionError {
    /// 锚点计算出的滑动区域无效
    #[error("滑动区域无效: top={top}, bottom={bottom}")]
    InvalidRegion { top: i32, bottom: i32 },
    /// 所有本地化候选锚点都不存在
    #[error("未找到任何锚点: {labels:?}")]
    AnchorMissing { labels: Vec<String> },
}

/// 编排层错误
#[derive(Debug, Error)]
pub enum OrchestrationError {
    /// 没有发现任何设备
    #[error("未发现任何 Android 设备")]
    NoDevices,
    /// links 模式缺少链接文件
    #[error("链接文件不存在: {}", path.display())]
    LinksFileMissing { path: PathBuf },
    /// worker 任务在自身保护范围之外崩溃
    #[error("[{serial}] worker 任务异常退出: {reason}")]
    WorkerCrashed { serial: String, reason: String },
}

// ========== 便捷构造函数 ==========

impl DeviceError {
    /// 创建元素未找到错误
    pub fn element_not_found(serial: impl Into<String>, selector: impl ToString) -> Self {
        DeviceError::ElementNotFound {
            serial: serial.into(),
            selector: selector.to_string(),
        }
    }

    /// 创建解析失败错误
    pub fn parse_failed(serial: impl Into<String>, what: &'static str, output: impl Into<String>) -> Self {
        DeviceError::ParseFailed {
            serial: serial.into(),
            what,
            output: output.into(),
        }
    }
}

impl FileError {
    /// 创建文件读取错误
    pub fn read_failed(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        FileError::ReadFailed {
            path: path.into(),
            source,
        }
    }
}

// ========== Result 类型别名 ==========

/// 设备操作结果类型
pub type DeviceResult<T> = Result<T, DeviceError>;

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
