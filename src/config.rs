use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{AppResult, ConfigError, FileError};

/// 程序配置文件
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// adb 可执行文件路径
    pub adb_path: String,
    /// tesseract 可执行文件路径
    pub tesseract_path: String,
    /// OCR 语言
    pub ocr_language: String,
    /// links 模式使用的链接文件
    pub links_file: PathBuf,
    /// 锁屏界面所属的包名
    pub lock_screen_package: String,
    /// 等待解锁的轮询间隔（毫秒）
    pub unlock_poll_ms: u64,
    /// 等待解锁时允许连续查询失败的次数
    pub unlock_error_tolerance: u32,
    /// 中断后每个 worker 的宽限时间（毫秒）
    pub shutdown_grace_ms: u64,
    /// 等待锚点元素出现的最长时间（毫秒）
    pub element_wait_ms: u64,
    /// 元素查找轮询间隔（毫秒）
    pub element_poll_ms: u64,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    pub classifier: ClassifierConfig,
    pub youtube: YoutubeConfig,
    pub google: GoogleConfig,
}

/// 屏幕分类器配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// 导航后的初始等待（毫秒）
    pub settle_delay_ms: u64,
    /// 两次截图之间的间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 最大截图次数
    pub max_polls: u32,
    /// 判定为评论区所需的命中次数
    pub comment_threshold: u32,
    /// 对比度增强系数
    pub contrast_factor: f32,
    /// 识别前是否放大 4 倍
    pub upscale: bool,
    pub keywords: KeywordConfig,
}

/// 分类关键词（小写子串匹配），每类可配置多个语言版本
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct KeywordConfig {
    pub sponsored: Vec<String>,
    pub concept: Vec<String>,
    pub comments: Vec<String>,
}

/// 视频应用配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct YoutubeConfig {
    pub package: String,
    /// 首页 "Home" 按钮的描述
    pub home_description: String,
    pub home_class: String,
    /// 顶部锚点（状态栏电池图标）
    pub top_anchor_id: String,
    /// 推荐页底部导航栏
    pub feed_bottom_anchor_id: String,
    /// 播放器区域
    pub player_id: String,
    /// 视频页内容根节点
    pub link_bottom_anchor_id: String,
    /// 推荐页滑动次数
    pub recommendation_swipes: u32,
    /// 单个视频滑动次数
    pub link_swipes: u32,
    /// 视频页底部内边距
    pub link_bottom_inset: i32,
    /// 赞助链接最多重新入队次数，None 表示不限制
    pub max_sponsored_retries: Option<u32>,
}

/// 搜索/资讯应用配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct GoogleConfig {
    pub package: String,
    /// 底部 "Discover" 导航按钮
    pub discover_id: String,
    /// 语音搜索按钮的描述，按优先级排列（主语言在前）
    pub voice_search_labels: Vec<String>,
    /// 资讯流结束标记的描述，任一出现即视为到底
    pub feed_end_labels: Vec<String>,
    /// 到底后回到顶部前后的停顿（毫秒）
    pub feed_end_pause_ms: u64,
    pub bottom_inset: i32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            adb_path: "adb".to_string(),
            tesseract_path: "tesseract".to_string(),
            ocr_language: "eng".to_string(),
            links_file: PathBuf::from("links.txt"),
            lock_screen_package: "com.android.systemui".to_string(),
            unlock_poll_ms: 500,
            unlock_error_tolerance: 3,
            shutdown_grace_ms: 5000,
            element_wait_ms: 10_000,
            element_poll_ms: 500,
            verbose_logging: false,
            classifier: ClassifierConfig::default(),
            youtube: YoutubeConfig::default(),
            google: GoogleConfig::default(),
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: 2000,
            poll_interval_ms: 250,
            max_polls: 10,
            comment_threshold: 3,
            contrast_factor: 1.5,
            upscale: false,
            keywords: KeywordConfig::default(),
        }
    }
}

impl Default for KeywordConfig {
    fn default() -> Self {
        Self {
            sponsored: vec!["sponsored".to_string()],
            concept: vec!["key concepts".to_string()],
            comments: vec!["comments".to_string()],
        }
    }
}

impl Default for YoutubeConfig {
    fn default() -> Self {
        Self {
            package: "com.google.android.youtube".to_string(),
            home_description: "Home".to_string(),
            home_class: "android.widget.Button".to_string(),
            top_anchor_id: "com.android.systemui:id/battery".to_string(),
            feed_bottom_anchor_id: "com.google.android.youtube:id/bottom_bar_container".to_string(),
            player_id: "com.google.android.youtube:id/watch_player".to_string(),
            link_bottom_anchor_id: "com.google.android.youtube:id/action_bar_root".to_string(),
            recommendation_swipes: 45,
            link_swipes: 16,
            link_bottom_inset: 100,
            max_sponsored_retries: None,
        }
    }
}

impl Default for GoogleConfig {
    fn default() -> Self {
        Self {
            package: "com.google.android.googlequicksearchbox".to_string(),
            discover_id: "com.google.android.googlequicksearchbox:id/googleapp_navigation_bar_discover"
                .to_string(),
            voice_search_labels: vec!["Voice search".to_string(), "Голосовой поиск".to_string()],
            feed_end_labels: vec!["More stories".to_string(), "Другие статьи".to_string()],
            feed_end_pause_ms: 3000,
            bottom_inset: 100,
        }
    }
}

impl Config {
    /// 加载配置：TOML 文件（可选） → 环境变量覆盖
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let config = match path {
            Some(path) if path.is_file() => Self::from_toml_file(path)?,
            Some(path) => {
                debug!("配置文件 {} 不存在，使用默认配置", path.display());
                Self::default()
            }
            None => Self::default(),
        };
        let config = config.with_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件读取
    pub fn from_toml_file(path: &Path) -> AppResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| FileError::read_failed(path, e))?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_path_buf(),
            source,
        })?;
        info!("已加载配置文件: {}", path.display());
        Ok(config)
    }

    /// 应用环境变量覆盖
    pub fn with_env_overrides(mut self) -> Result<Self, ConfigError> {
        if let Ok(v) = std::env::var("ADB_PATH") {
            self.adb_path = v;
        }
        if let Ok(v) = std::env::var("TESSERACT_PATH") {
            self.tesseract_path = v;
        }
        if let Ok(v) = std::env::var("OCR_LANGUAGE") {
            self.ocr_language = v;
        }
        if let Ok(v) = std::env::var("LINKS_FILE") {
            self.links_file = PathBuf::from(v);
        }
        if let Some(v) = parse_env("UNLOCK_ERROR_TOLERANCE", "u32")? {
            self.unlock_error_tolerance = v;
        }
        if let Some(v) = parse_env("SHUTDOWN_GRACE_MS", "u64")? {
            self.shutdown_grace_ms = v;
        }
        if let Some(v) = parse_env("VERBOSE_LOGGING", "bool")? {
            self.verbose_logging = v;
        }
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.unlock_error_tolerance == 0 {
            return Err(ConfigError::InvalidValue {
                name: "unlock_error_tolerance",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.classifier.max_polls == 0 {
            return Err(ConfigError::InvalidValue {
                name: "classifier.max_polls",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.classifier.comment_threshold == 0 {
            return Err(ConfigError::InvalidValue {
                name: "classifier.comment_threshold",
                reason: "必须大于 0".to_string(),
            });
        }
        if self.google.voice_search_labels.is_empty() {
            return Err(ConfigError::InvalidValue {
                name: "google.voice_search_labels",
                reason: "至少需要一个候选描述".to_string(),
            });
        }
        Ok(())
    }

    pub fn unlock_poll_interval(&self) -> Duration {
        Duration::from_millis(self.unlock_poll_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

fn parse_env<T: std::str::FromStr>(
    var_name: &str,
    expected_type: &'static str,
) -> Result<Option<T>, ConfigError> {
    match std::env::var(var_name) {
        Ok(value) => value
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type,
            }),
        Err(_) => Ok(None),
    }
}
