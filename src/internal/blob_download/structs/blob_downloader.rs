//! Blob 下载器
//!
//! 按 digest 把 registry 中的一个 blob 下载到内容寻址存储，支持大文件分片并发、断点续传，
//! 以及同一 digest 的并发调用去重。
//!
//! ## 功能特性
//!
//! - **快速返回**：blob 文件已存在且没有断点文件时，直接报告一次 `completed == total`，不发任何请求
//! - **分片并发下载**：`[0, total)` 按固定大小（默认 256MB）切片，每片一个 Range 请求，信号量限制并发数
//! - **断点续传**：断点文件 `<blob>.json` 记录每片已完成字节数，续传时从分片内的断点继续
//! - **分片重试**：每个分片独立计算重试次数，重试只补齐本分片剩余字节
//! - **进度回调**：所有分片共享一个计数器，回调收到的 `completed` 单调不减
//! - **调用去重**：同一 digest 已在下载时，后来的调用方只监听进度，不重复下载
//!
//! ## 使用示例
//!
//! ```rust,no_run
//! # use std::sync::Arc;
//! # use blob_fetch::download::{BlobDownloader, DownloadOptions, InProgressRegistry};
//! # use blob_fetch::registry::{BlobSource, HttpRegistryClient, RegistryAuth};
//! # use blob_fetch::store::BlobStore;
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = Arc::new(HttpRegistryClient::new(RegistryAuth::anonymous())?);
//! let downloader = BlobDownloader::new(client, BlobStore::from_env(), InProgressRegistry::new())
//!     .max_concurrent_parts(4);
//!
//! let source = BlobSource::new("https://registry.example.com", "library/llama")?;
//! let options = DownloadOptions::new().on_progress(|event| {
//!     println!("{} {:.1}%", event.status, event.pct());
//! });
//! downloader
//!     .download_blob("sha256:0123abcd", &source, options)
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## 内部实现说明
//!
//! - `resume` 子模块：根据本地文件与断点文件判断快速返回、续传或从头开始
//! - `probe` 子模块：HEAD 探测 blob 总大小
//! - `chunked_download` 子模块：分片任务调度、Range 请求、写盘与重试

mod chunked_download;
mod probe;
mod resume;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::fs::{self, OpenOptions};
use tokio_util::sync::CancellationToken;

use crate::internal::registry::structs::BlobSource;
use crate::internal::registry::traits::RegistryClient;
use crate::internal::store::structs::{BlobStore, Digest};

use super::blob_download::BlobDownload;
use super::checkpoint::CheckpointStore;
use super::download_config::{DownloadConfig, DownloadOptions};
use super::download_error::DownloadError;
use super::in_progress_registry::{InFlightGuard, InProgressRegistry, Registration};
use super::progress_event::ProgressEvent;
use super::progress_tracker::ProgressTracker;
use chunked_download::{PartLedger, RunPartTasksParams, run_part_tasks};
use resume::{ResumeOutcome, check_resume};

/// Blob 下载器：持有 registry 客户端、本地存储与进行中下载表，可在多个任务间共享。
#[derive(Clone)]
pub struct BlobDownloader {
    client: Arc<dyn RegistryClient>,
    store: BlobStore,
    registry: InProgressRegistry,
    config: DownloadConfig,
}

impl BlobDownloader {
    pub fn new(
        client: Arc<dyn RegistryClient>,
        store: BlobStore,
        registry: InProgressRegistry,
    ) -> Self {
        Self {
            client,
            store,
            registry,
            config: DownloadConfig::default(),
        }
    }

    /// 只影响新建的下载；已有断点沿用断点里的划分。
    pub fn part_size(mut self, part_size: u64) -> Self {
        self.config.part_size = part_size.max(1);
        self
    }

    pub fn max_concurrent_parts(mut self, n: usize) -> Self {
        self.config.max_concurrent_parts = n.max(1);
        self
    }

    pub fn max_retries(mut self, n: usize) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.config.retry_delay = delay;
        self
    }

    pub fn config(&self) -> &DownloadConfig {
        &self.config
    }

    pub fn registry(&self) -> &InProgressRegistry {
        &self.registry
    }

    pub fn store(&self) -> &BlobStore {
        &self.store
    }

    /// 下载 `digest` 对应的 blob，返回时文件已完整落盘（或返回错误，断点留待下次续传）。
    ///
    /// 同一 digest 已有下载在进行时，本次调用只转发那次下载的进度并等待其结束。
    pub async fn download_blob(
        &self,
        digest: &str,
        source: &BlobSource,
        options: DownloadOptions,
    ) -> Result<(), DownloadError> {
        let digest = Digest::parse(digest)?;
        let key = digest.to_string();
        let cancel = options.cancel.clone().unwrap_or_default();

        let guard = match self.registry.register(&key) {
            Registration::Follower(existing) => {
                tracing::info!(digest = %key, "download already in progress, following");
                return existing.follow(options.on_progress.as_ref(), &cancel).await;
            }
            Registration::Leader(guard) => guard,
        };

        let result = self
            .run_leader(&digest, source, &options, &cancel, &guard)
            .await;
        match &result {
            Ok(()) => tracing::info!(digest = %key, "blob download finished"),
            Err(e) => tracing::warn!(digest = %key, kind = ?e.kind(), "blob download failed: {}", e),
        }
        guard.finish(&result);
        result
    }

    async fn run_leader(
        &self,
        digest: &Digest,
        source: &BlobSource,
        options: &DownloadOptions,
        cancel: &CancellationToken,
        guard: &InFlightGuard,
    ) -> Result<(), DownloadError> {
        let key = digest.to_string();
        let blob_path = self.store.blob_path(digest);
        let checkpoint = Arc::new(CheckpointStore::new(self.store.checkpoint_path(digest)));

        fs::create_dir_all(self.store.root())
            .await
            .map_err(DownloadError::CreateFile)?;

        let download = match check_resume(&blob_path, &checkpoint).await? {
            ResumeOutcome::AlreadyComplete { size } => {
                tracing::debug!(digest = %key, size, "blob already present");
                let tracker = ProgressTracker::new(
                    &key,
                    size,
                    size,
                    options.on_progress.clone(),
                    guard.entry().state(),
                );
                tracker.report();
                return Ok(());
            }
            ResumeOutcome::Resume(download) => {
                tracing::info!(
                    digest = %key,
                    completed = download.completed,
                    total = download.total,
                    "resuming from checkpoint"
                );
                download
            }
            ResumeOutcome::Fresh => {
                let url = source.blob_url(digest);
                let total = tokio::select! {
                    _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
                    total = probe::probe_total(self.client.as_ref(), &url) => total?,
                };
                let download = BlobDownload::partitioned(total, self.config.part_size);
                tracing::info!(
                    digest = %key,
                    total,
                    parts = download.parts.len(),
                    "starting new download"
                );
                checkpoint.save(&download).await?;
                download
            }
        };

        preallocate(&blob_path, download.total).await?;

        let ledger = Arc::new(PartLedger::new(&download));
        let tracker = Arc::new(ProgressTracker::new(
            &key,
            download.total,
            ledger.completed(),
            options.on_progress.clone(),
            guard.entry().state(),
        ));
        tracker.report();

        // 子令牌：分片失败只取消本次下载，不影响调用方的令牌
        let token = cancel.child_token();
        let run = run_part_tasks(RunPartTasksParams {
            client: Arc::clone(&self.client),
            url: source.blob_url(digest),
            path: blob_path,
            ledger: Arc::clone(&ledger),
            tracker: Arc::clone(&tracker),
            checkpoint: Arc::clone(&checkpoint),
            max_concurrent: self.config.max_concurrent_parts,
            max_retries: options.max_retries.unwrap_or(self.config.max_retries),
            retry_delay: self.config.retry_delay,
            token,
        })
        .await;

        if let Err(e) = run {
            let snapshot = Arc::clone(&ledger);
            if let Err(save_err) = checkpoint.save_with(move || snapshot.snapshot()).await {
                tracing::warn!(digest = %key, "failed to persist checkpoint after error: {}", save_err);
            }
            return Err(e);
        }

        if !ledger.is_complete() {
            return Err(DownloadError::ChunkedInternal(format!(
                "所有分片任务已结束，但只完成了 {}/{} 字节",
                ledger.completed(),
                download.total
            )));
        }

        tracker.finish();
        checkpoint.remove().await
    }
}

/// 创建（不截断）目标文件并设置为完整大小，必须在任何分片写入之前完成。
async fn preallocate(path: &Path, total: u64) -> Result<(), DownloadError> {
    let file = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .await
        .map_err(DownloadError::CreateFile)?;
    file.set_len(total)
        .await
        .map_err(DownloadError::PreallocateFile)
}

/// 便捷入口：用默认配置下载一个 blob。
pub async fn download_blob(
    client: Arc<dyn RegistryClient>,
    store: BlobStore,
    registry: InProgressRegistry,
    digest: &str,
    source: &BlobSource,
    on_progress: impl Fn(ProgressEvent) + Send + Sync + 'static,
) -> Result<(), DownloadError> {
    BlobDownloader::new(client, store, registry)
        .download_blob(digest, source, DownloadOptions::new().on_progress(on_progress))
        .await
}
