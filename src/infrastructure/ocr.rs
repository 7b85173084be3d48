//! OCR 引擎 - 基础设施层
//!
//! 通过 tesseract 命令行识别截图文字，输出 TSV 格式的词块

use std::io::Cursor;
use std::process::Stdio;

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::OcrError;

/// 识别出的单个词块
#[derive(Debug, Clone, PartialEq)]
pub struct OcrToken {
    pub text: String,
    pub confidence: f32,
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// 一次识别的结果
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OcrOutput {
    pub tokens: Vec<OcrToken>,
}

impl OcrOutput {
    /// 所有词块以空格拼接
    pub fn joined_text(&self) -> String {
        self.tokens
            .iter()
            .map(|token| token.text.as_str())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// OCR 引擎
#[async_trait]
pub trait OcrEngine: Send + Sync {
    async fn image_to_text(&self, image: &DynamicImage, language: &str) -> Result<OcrOutput, OcrError>;
}

/// 基于 tesseract 命令行的 OCR 引擎
pub struct TesseractOcr {
    program: String,
}

impl TesseractOcr {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl OcrEngine for TesseractOcr {
    async fn image_to_text(&self, image: &DynamicImage, language: &str) -> Result<OcrOutput, OcrError> {
        let mut png = Vec::new();
        image.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;

        let mut child = Command::new(&self.program)
            .args(["stdin", "stdout", "-l", language, "tsv"])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| OcrError::SpawnFailed {
                program: self.program.clone(),
                source,
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&png)
                .await
                .map_err(|source| OcrError::SpawnFailed {
                    program: self.program.clone(),
                    source,
                })?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|source| OcrError::SpawnFailed {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            return Err(OcrError::ProcessFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let result = parse_tsv(&String::from_utf8_lossy(&output.stdout));
        debug!("OCR 识别到 {} 个词块", result.tokens.len());
        Ok(result)
    }
}

/// 解析 tesseract TSV 输出
///
/// 列：level page_num block_num par_num line_num word_num left top width height conf text
pub fn parse_tsv(tsv: &str) -> OcrOutput {
    let tokens = tsv
        .lines()
        .skip(1)
        .filter_map(|line| {
            let columns: Vec<&str> = line.split('\t').collect();
            if columns.len() < 12 {
                return None;
            }
            let text = columns[11].trim();
            if text.is_empty() {
                return None;
            }
            Some(OcrToken {
                text: text.to_string(),
                confidence: columns[10].parse().unwrap_or(-1.0),
                left: columns[6].parse().unwrap_or_default(),
                top: columns[7].parse().unwrap_or_default(),
                width: columns[8].parse().unwrap_or_default(),
                height: columns[9].parse().unwrap_or_default(),
            })
        })
        .collect();
    OcrOutput { tokens }
}
