//! 屏幕分类服务 - 业务能力层
//!
//! 只负责"当前屏幕是什么内容"的判断：截图 → 增强 → OCR → 关键词匹配。
//! 关键词匹配本身是纯函数，轮询和计数在 [`ScreenClassifier::wait_for_category`] 中完成。

use std::sync::Arc;
use std::time::Duration;

use image::imageops::FilterType;
use image::{DynamicImage, Rgb};
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::config::{ClassifierConfig, Config, KeywordConfig};
use crate::error::DeviceResult;
use crate::infrastructure::{Device, OcrEngine};
use crate::models::ContentCategory;

/// 评论关键词去抖计数
///
/// 评论区渲染过程中 "comments" 可能短暂出现，需要累计多次命中才确认
#[derive(Debug, Clone)]
pub struct CommentDebounce {
    sightings: u32,
    threshold: u32,
}

impl CommentDebounce {
    pub fn new(threshold: u32) -> Self {
        Self {
            sightings: 0,
            threshold,
        }
    }

    /// 记录一次命中，返回是否达到阈值
    fn sight(&mut self) -> bool {
        self.sightings += 1;
        self.sightings >= self.threshold
    }

    pub fn sightings(&self) -> u32 {
        self.sightings
    }
}

/// 关键词匹配器（小写子串匹配）
#[derive(Debug, Clone)]
pub struct KeywordMatcher {
    sponsored: Vec<String>,
    concept: Vec<String>,
    comments: Vec<String>,
}

impl KeywordMatcher {
    pub fn new(keywords: &KeywordConfig) -> Self {
        let lower = |words: &[String]| -> Vec<String> {
            words.iter().map(|w| w.to_lowercase()).collect()
        };
        Self {
            sponsored: lower(&keywords.sponsored),
            concept: lower(&keywords.concept),
            comments: lower(&keywords.comments),
        }
    }

    /// 对一次识别结果做分类
    ///
    /// 匹配顺序：赞助 → 概念卡片 → 评论（需去抖），先命中者生效
    pub fn classify(&self, text: &str, debounce: &mut CommentDebounce) -> Option<ContentCategory> {
        let text = text.to_lowercase();
        let contains_any = |words: &[String]| words.iter().any(|w| text.contains(w.as_str()));

        if contains_any(&self.sponsored) {
            return Some(ContentCategory::Sponsored);
        }
        if contains_any(&self.concept) {
            return Some(ContentCategory::ConceptCard);
        }
        if contains_any(&self.comments) && debounce.sight() {
            return Some(ContentCategory::Comments);
        }
        None
    }
}

/// 屏幕分类服务
///
/// 职责：
/// - 截图并识别文字
/// - 在固定轮询预算内给出内容类型
/// - 不关心链接队列和滚动
pub struct ScreenClassifier {
    ocr: Arc<dyn OcrEngine>,
    language: String,
    settings: ClassifierConfig,
    matcher: KeywordMatcher,
}

impl ScreenClassifier {
    pub fn new(ocr: Arc<dyn OcrEngine>, config: &Config) -> Self {
        Self {
            ocr,
            language: config.ocr_language.clone(),
            matcher: KeywordMatcher::new(&config.classifier.keywords),
            settings: config.classifier.clone(),
        }
    }

    /// 截图并返回识别出的小写文本
    ///
    /// OCR 失败只记录警告并视为空文本
    pub async fn read_screen(&self, device: &dyn Device) -> DeviceResult<String> {
        let screenshot = device.screenshot().await?;
        let prepared = prepare_for_ocr(
            &screenshot,
            self.settings.contrast_factor,
            self.settings.upscale,
        );

        match self.ocr.image_to_text(&prepared, &self.language).await {
            Ok(output) => Ok(output.joined_text().to_lowercase()),
            Err(e) => {
                warn!("[{}] OCR 识别失败，按空文本处理: {}", device.serial(), e);
                Ok(String::new())
            }
        }
    }

    /// 等待页面稳定并判断内容类型
    ///
    /// 预算耗尽或收到停止信号时返回 [`ContentCategory::Undetermined`]
    pub async fn wait_for_category(
        &self,
        device: &dyn Device,
        cancel: &CancellationToken,
    ) -> DeviceResult<ContentCategory> {
        sleep(Duration::from_millis(self.settings.settle_delay_ms)).await;

        let mut debounce = CommentDebounce::new(self.settings.comment_threshold);
        for poll in 1..=self.settings.max_polls {
            if cancel.is_cancelled() {
                debug!("[{}] 收到停止信号，中止分类轮询", device.serial());
                break;
            }
            sleep(Duration::from_millis(self.settings.poll_interval_ms)).await;

            let text = self.read_screen(device).await?;
            if let Some(category) = self.matcher.classify(&text, &mut debounce) {
                debug!(
                    "[{}] 第 {}/{} 次轮询判定为 {}",
                    device.serial(),
                    poll,
                    self.settings.max_polls,
                    category
                );
                return Ok(category);
            }
        }

        debug!(
            "[{}] 分类预算耗尽 (评论命中 {} 次)",
            device.serial(),
            debounce.sightings()
        );
        Ok(ContentCategory::Undetermined)
    }
}

/// OCR 前处理：可选放大 4 倍，再增强对比度
pub fn prepare_for_ocr(image: &DynamicImage, contrast_factor: f32, upscale: bool) -> DynamicImage {
    let scaled;
    let source = if upscale {
        scaled = image.resize_exact(image.width() * 4, image.height() * 4, FilterType::CatmullRom);
        &scaled
    } else {
        image
    };
    enhance_contrast(source, contrast_factor)
}

/// 对比度增强
///
/// 以灰度均值为中心线性拉伸：`out = mean + factor * (in - mean)`
pub fn enhance_contrast(image: &DynamicImage, factor: f32) -> DynamicImage {
    let mut rgb = image.to_rgb8();
    let pixel_count = (u64::from(rgb.width()) * u64::from(rgb.height())).max(1);
    let luma_sum: u64 = rgb.pixels().map(|p| u64::from(luma(p))).sum();
    let mean = (luma_sum as f32 / pixel_count as f32 + 0.5).floor();

    for pixel in rgb.pixels_mut() {
        for channel in pixel.0.iter_mut() {
            let value = mean + factor * (f32::from(*channel) - mean);
            *channel = value.round().clamp(0.0, 255.0) as u8;
        }
    }
    DynamicImage::ImageRgb8(rgb)
}

fn luma(pixel: &Rgb<u8>) -> u8 {
    let [r, g, b] = pixel.0;
    ((u32::from(r) * 299 + u32::from(g) * 587 + u32::from(b) * 114) / 1000) as u8
}
