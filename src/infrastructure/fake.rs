//! 测试用的设备与 OCR 替身
//!
//! 记录所有设备调用，界面元素和识别文字由测试脚本预设

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use image::DynamicImage;

use crate::error::{DeviceError, DeviceResult, OcrError};
use crate::infrastructure::device::Device;
use crate::infrastructure::ocr::{OcrEngine, OcrOutput, OcrToken};
use crate::models::{Bounds, Orientation, Selector};

/// 设备调用记录
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    AppStart(String),
    AppStop(String),
    AppStopAll,
    Screenshot,
    Tap(i32, i32),
    Swipe(Vec<(i32, i32)>, Duration),
    SetOrientation(Orientation),
    Shell(String),
}

/// 设备与 OCR 共享的"屏幕"：当前打开的链接
#[derive(Debug, Default)]
pub struct ScreenState {
    link: Mutex<Option<String>>,
}

impl ScreenState {
    pub fn current_link(&self) -> Option<String> {
        self.link.lock().unwrap().clone()
    }
}

struct FakeElement {
    selector: Selector,
    bounds: Bounds,
    visible_after_swipes: u32,
}

/// 滑动到一定次数后，接下来若干次查找看不到该元素
struct HideRule {
    selector: Selector,
    after_swipes: u32,
    lookups: AtomicU32,
}

pub struct FakeDevice {
    serial: String,
    calls: Mutex<Vec<Call>>,
    locked_polls: AtomicU32,
    unknown_polls: AtomicU32,
    failing_polls: AtomicU32,
    lock_package: String,
    elements: Vec<FakeElement>,
    hidden: Vec<HideRule>,
    width: u32,
    fail_app_start: bool,
    panic_on_swipe: bool,
    panic_on_stop_all: bool,
    swipe_delay: Duration,
    screen: Arc<ScreenState>,
}

impl FakeDevice {
    pub fn new(serial: &str) -> Self {
        Self {
            serial: serial.to_string(),
            calls: Mutex::new(Vec::new()),
            locked_polls: AtomicU32::new(0),
            unknown_polls: AtomicU32::new(0),
            failing_polls: AtomicU32::new(0),
            lock_package: "com.android.systemui".to_string(),
            elements: Vec::new(),
            hidden: Vec::new(),
            width: 1080,
            fail_app_start: false,
            panic_on_swipe: false,
            panic_on_stop_all: false,
            swipe_delay: Duration::ZERO,
            screen: Arc::new(ScreenState::default()),
        }
    }

    /// 预设所有会话用到的锚点
    pub fn with_default_anchors(self) -> Self {
        let youtube = crate::config::YoutubeConfig::default();
        let google = crate::config::GoogleConfig::default();
        self.with_element(
            Selector::description(&youtube.home_description).with_class(&youtube.home_class),
            Bounds::new(0, 2250, 216, 2400),
        )
        .with_element(
            Selector::resource_id(&youtube.top_anchor_id),
            Bounds::new(950, 20, 1040, 80),
        )
        .with_element(
            Selector::resource_id(&youtube.feed_bottom_anchor_id),
            Bounds::new(0, 2240, 1080, 2400),
        )
        .with_element(
            Selector::resource_id(&youtube.player_id),
            Bounds::new(0, 80, 1080, 688),
        )
        .with_element(
            Selector::resource_id(&youtube.link_bottom_anchor_id),
            Bounds::new(0, 80, 1080, 2400),
        )
        .with_element(
            Selector::resource_id(&google.discover_id),
            Bounds::new(0, 2200, 270, 2400),
        )
    }

    pub fn with_element(mut self, selector: Selector, bounds: Bounds) -> Self {
        self.elements.push(FakeElement {
            selector,
            bounds,
            visible_after_swipes: 0,
        });
        self
    }

    /// 元素在累计滑动 `swipes` 次后才出现
    pub fn with_element_after_swipes(mut self, selector: Selector, bounds: Bounds, swipes: u32) -> Self {
        self.elements.push(FakeElement {
            selector,
            bounds,
            visible_after_swipes: swipes,
        });
        self
    }

    /// 前 `polls` 次前台查询返回锁屏
    pub fn locked_for(self, polls: u32) -> Self {
        self.locked_polls.store(polls, Ordering::SeqCst);
        self
    }

    /// 前 `polls` 次前台查询拿不到包名（界面层级为空）
    pub fn unknown_foreground_for(self, polls: u32) -> Self {
        self.unknown_polls.store(polls, Ordering::SeqCst);
        self
    }

    /// 前 `polls` 次前台查询返回 adb 错误
    pub fn failing_foreground_for(self, polls: u32) -> Self {
        self.failing_polls.store(polls, Ordering::SeqCst);
        self
    }

    /// 累计滑动 `after_swipes` 次后，接下来 `lookups` 次查找找不到该元素（界面刷新中）
    pub fn hiding_after_swipes(mut self, selector: Selector, after_swipes: u32, lookups: u32) -> Self {
        self.hidden.push(HideRule {
            selector,
            after_swipes,
            lookups: AtomicU32::new(lookups),
        });
        self
    }

    pub fn failing_app_start(mut self) -> Self {
        self.fail_app_start = true;
        self
    }

    pub fn panicking_on_swipe(mut self) -> Self {
        self.panic_on_swipe = true;
        self
    }

    /// 清理阶段崩溃，用于模拟 worker 保护范围之外的故障
    pub fn panicking_on_stop_all(mut self) -> Self {
        self.panic_on_stop_all = true;
        self
    }

    /// 每次滑动耗时，用于模拟卡在循环中的会话
    pub fn with_swipe_delay(mut self, delay: Duration) -> Self {
        self.swipe_delay = delay;
        self
    }

    pub fn screen(&self) -> Arc<ScreenState> {
        self.screen.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| predicate(c)).count()
    }

    pub fn swipes(&self) -> Vec<Vec<(i32, i32)>> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                Call::Swipe(points, _) => Some(points.clone()),
                _ => None,
            })
            .collect()
    }

    /// 通过 VIEW intent 打开过的链接（按顺序）
    pub fn opened_links(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter_map(|call| match call {
                Call::Shell(command) => extract_link(command),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    fn swipe_count(&self) -> u32 {
        self.count(|c| matches!(c, Call::Swipe(..))) as u32
    }
}

/// 计数大于 0 时减一并返回 true
fn take_one(counter: &AtomicU32) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

fn extract_link(command: &str) -> Option<String> {
    let start = command.find("-d \"")? + 4;
    let end = command[start..].find('"')? + start;
    Some(command[start..end].to_string())
}

#[async_trait]
impl Device for FakeDevice {
    fn serial(&self) -> &str {
        &self.serial
    }

    async fn current_package(&self) -> DeviceResult<Option<String>> {
        if take_one(&self.failing_polls) {
            return Err(DeviceError::CommandFailed {
                serial: self.serial.clone(),
                command: "exec-out uiautomator dump /dev/tty".to_string(),
                stderr: "error: closed".to_string(),
            });
        }
        if take_one(&self.unknown_polls) {
            return Ok(None);
        }
        if take_one(&self.locked_polls) {
            Ok(Some(self.lock_package.clone()))
        } else {
            Ok(Some("com.android.launcher3".to_string()))
        }
    }

    async fn app_start(&self, package: &str) -> DeviceResult<()> {
        self.record(Call::AppStart(package.to_string()));
        if self.fail_app_start {
            return Err(DeviceError::CommandFailed {
                serial: self.serial.clone(),
                command: format!("monkey -p {}", package),
                stderr: "** No activities found to run, monkey aborted.".to_string(),
            });
        }
        Ok(())
    }

    async fn app_stop(&self, package: &str) -> DeviceResult<()> {
        self.record(Call::AppStop(package.to_string()));
        Ok(())
    }

    async fn app_stop_all(&self) -> DeviceResult<Vec<String>> {
        self.record(Call::AppStopAll);
        if self.panic_on_stop_all {
            panic!("fake device panicked while stopping apps");
        }
        Ok(Vec::new())
    }

    async fn screenshot(&self) -> DeviceResult<DynamicImage> {
        self.record(Call::Screenshot);
        Ok(DynamicImage::new_rgb8(4, 4))
    }

    async fn find(&self, selector: &Selector) -> DeviceResult<Option<Bounds>> {
        let swipes = self.swipe_count();
        let hidden = self
            .hidden
            .iter()
            .filter(|rule| rule.selector == *selector && swipes >= rule.after_swipes)
            .any(|rule| take_one(&rule.lookups));
        if hidden {
            return Ok(None);
        }
        Ok(self
            .elements
            .iter()
            .find(|e| e.selector == *selector && swipes >= e.visible_after_swipes)
            .map(|e| e.bounds))
    }

    async fn tap(&self, x: i32, y: i32) -> DeviceResult<()> {
        self.record(Call::Tap(x, y));
        Ok(())
    }

    async fn swipe_points(&self, points: &[(i32, i32)], duration: Duration) -> DeviceResult<()> {
        if self.panic_on_swipe {
            panic!("fake device panicked during swipe");
        }
        if !self.swipe_delay.is_zero() {
            tokio::time::sleep(self.swipe_delay).await;
        }
        self.record(Call::Swipe(points.to_vec(), duration));
        Ok(())
    }

    async fn display_width(&self) -> DeviceResult<u32> {
        Ok(self.width)
    }

    async fn set_orientation(&self, orientation: Orientation) -> DeviceResult<()> {
        self.record(Call::SetOrientation(orientation));
        Ok(())
    }

    async fn shell(&self, command: &str) -> DeviceResult<String> {
        if let Some(link) = extract_link(command) {
            *self.screen.link.lock().unwrap() = Some(link);
        }
        self.record(Call::Shell(command.to_string()));
        Ok(String::new())
    }
}

/// 脚本化的 OCR
///
/// 优先消费 `script` 队列，之后按当前链接查表，最后返回 `fallback`
pub struct FakeOcr {
    screen: Arc<ScreenState>,
    script: Mutex<VecDeque<String>>,
    by_link: HashMap<String, String>,
    fallback: String,
    fail: bool,
    calls: AtomicUsize,
}

impl FakeOcr {
    pub fn new(screen: Arc<ScreenState>) -> Self {
        Self {
            screen,
            script: Mutex::new(VecDeque::new()),
            by_link: HashMap::new(),
            fallback: String::new(),
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_script(self, texts: &[&str]) -> Self {
        *self.script.lock().unwrap() = texts.iter().map(|t| t.to_string()).collect();
        self
    }

    pub fn with_link_text(mut self, link: &str, text: &str) -> Self {
        self.by_link.insert(link.to_string(), text.to_string());
        self
    }

    pub fn with_fallback(mut self, text: &str) -> Self {
        self.fallback = text.to_string();
        self
    }

    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OcrEngine for FakeOcr {
    async fn image_to_text(&self, _image: &DynamicImage, _language: &str) -> Result<OcrOutput, OcrError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(OcrError::ProcessFailed {
                status: "exit status: 1".to_string(),
                stderr: "Error opening data file eng.traineddata".to_string(),
            });
        }

        let scripted = self.script.lock().unwrap().pop_front();
        let text = scripted
            .or_else(|| {
                self.screen
                    .current_link()
                    .and_then(|link| self.by_link.get(&link).cloned())
            })
            .unwrap_or_else(|| self.fallback.clone());

        let tokens = text
            .split_whitespace()
            .map(|word| OcrToken {
                text: word.to_string(),
                confidence: 90.0,
                left: 0,
                top: 0,
                width: 0,
                height: 0,
            })
            .collect();
        Ok(OcrOutput { tokens })
    }
}
