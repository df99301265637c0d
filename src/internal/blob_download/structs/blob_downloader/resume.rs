//! 断点续传：根据本地 blob 文件与断点文件决定快速返回、续传还是从头开始。

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;

use crate::internal::blob_download::structs::{BlobDownload, CheckpointStore, DownloadError};

/// 续传检查结果。
#[derive(Debug)]
pub(super) enum ResumeOutcome {
    /// 文件已存在且没有断点：上一次已完整下载
    AlreadyComplete { size: u64 },
    /// 沿用断点中的划分与进度
    Resume(BlobDownload),
    /// 既无文件也无断点，需要先探测大小
    Fresh,
}

/// 本地 blob 文件的长度；不存在时返回 `None`。
async fn local_len(path: &Path) -> Result<Option<u64>, DownloadError> {
    match fs::metadata(path).await {
        Ok(meta) => Ok(Some(meta.len())),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(DownloadError::StatFile(e)),
    }
}

/// 检查本地状态。断点存在但 blob 文件缺失或长度不符时，保留划分、清零进度。
pub(super) async fn check_resume(
    blob_path: &Path,
    checkpoint: &CheckpointStore,
) -> Result<ResumeOutcome, DownloadError> {
    let file_len = local_len(blob_path).await?;
    let saved = checkpoint.load().await?;

    match (saved, file_len) {
        (None, Some(size)) => Ok(ResumeOutcome::AlreadyComplete { size }),
        (None, None) => Ok(ResumeOutcome::Fresh),
        (Some(mut download), file_len) => {
            if download.completed > 0 && file_len != Some(download.total) {
                tracing::warn!(
                    path = %blob_path.display(),
                    expected = download.total,
                    found = ?file_len,
                    "blob file missing or resized, discarding recorded progress"
                );
                download.reset_progress();
            }
            Ok(ResumeOutcome::Resume(download))
        }
    }
}
