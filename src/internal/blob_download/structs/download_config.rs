use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::progress_event::{ProgressEvent, ProgressFn};

/// 默认分片大小：256MB
pub const DEFAULT_PART_SIZE: u64 = 256 * 1024 * 1024;

/// 默认同时下载的分片数
pub const DEFAULT_MAX_CONCURRENT_PARTS: usize = 10;

/// 默认每个分片的重试次数（不含首次尝试）
pub const DEFAULT_MAX_RETRIES: usize = 3;

/// 默认重试间隔
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);

/// 下载器级配置，由 [`BlobDownloader`](super::BlobDownloader) 的链式方法修改。
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    /// 每个分片的大小（字节），最后一片取余数
    pub part_size: u64,
    /// 最大并发分片数
    pub max_concurrent_parts: usize,
    /// 分片失败最大重试次数
    pub max_retries: usize,
    /// 两次尝试之间的固定间隔
    pub retry_delay: Duration,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            max_concurrent_parts: DEFAULT_MAX_CONCURRENT_PARTS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay: DEFAULT_RETRY_DELAY,
        }
    }
}

/// 单次 `download_blob` 调用的选项：进度回调、重试预算覆盖、取消令牌。
#[derive(Clone, Default)]
pub struct DownloadOptions {
    pub(crate) on_progress: Option<ProgressFn>,
    pub(crate) max_retries: Option<usize>,
    pub(crate) cancel: Option<CancellationToken>,
}

impl DownloadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册进度回调；会在多个分片任务中被调用，需尽快返回。
    pub fn on_progress<F>(mut self, f: F) -> Self
    where
        F: Fn(ProgressEvent) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(f));
        self
    }

    /// 覆盖下载器配置中的分片重试次数。
    pub fn max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// 调用方取消令牌；取消后所有分片尽快停止，返回 `Cancelled`。
    pub fn cancellation_token(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

impl std::fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("on_progress", &self.on_progress.as_ref().map(|_| "<fn>"))
            .field("max_retries", &self.max_retries)
            .field("cancel", &self.cancel)
            .finish()
    }
}
