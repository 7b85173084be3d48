//! 链接队列
//!
//! 链接文件一次性读入；赞助内容的链接追加到队尾稍后重试，
//! 因此队列在处理过程中可能增长

use std::collections::HashMap;
use std::path::Path;

use tokio::fs;
use tracing::info;

use crate::error::{AppResult, FileError};

#[derive(Debug, Clone)]
pub struct LinkQueue {
    links: Vec<String>,
    cursor: usize,
    requeued: HashMap<String, u32>,
    max_retries: Option<u32>,
}

impl LinkQueue {
    /// 空行忽略，每行去除首尾空白
    pub fn from_lines<I, S>(lines: I, max_retries: Option<u32>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let links = lines
            .into_iter()
            .map(|line| line.as_ref().trim().to_string())
            .filter(|line| !line.is_empty())
            .collect();
        Self {
            links,
            cursor: 0,
            requeued: HashMap::new(),
            max_retries,
        }
    }

    /// 从文件加载
    pub async fn load(path: &Path, max_retries: Option<u32>) -> AppResult<Self> {
        if !path.is_file() {
            return Err(FileError::NotFound {
                path: path.to_path_buf(),
            }
            .into());
        }
        let content = fs::read_to_string(path)
            .await
            .map_err(|e| FileError::read_failed(path, e))?;
        let queue = Self::from_lines(content.lines(), max_retries);
        info!("已加载 {} 条链接: {}", queue.len(), path.display());
        Ok(queue)
    }

    /// 取出下一条链接
    pub fn next_link(&mut self) -> Option<String> {
        let link = self.links.get(self.cursor).cloned()?;
        self.cursor += 1;
        Some(link)
    }

    /// 把链接追加到队尾
    ///
    /// 超过重试上限时返回 `false`，链接被放弃
    pub fn requeue(&mut self, link: String) -> bool {
        let count = self.requeued.entry(link.clone()).or_insert(0);
        if self.max_retries.is_some_and(|max| *count >= max) {
            return false;
        }
        *count += 1;
        self.links.push(link);
        true
    }

    /// 队列总长度（含已处理和重新入队的条目）
    pub fn len(&self) -> usize {
        self.links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }

    /// 已取出的条目数
    pub fn processed(&self) -> usize {
        self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.links.len() - self.cursor
    }
}
