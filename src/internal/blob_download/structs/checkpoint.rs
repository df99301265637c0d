//! 断点文件的读写：`<blob>.json`，写入走「临时文件 + rename」，崩溃时不会留下半截 JSON。

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::blob_download::BlobDownload;
use super::download_error::DownloadError;

#[derive(Debug)]
pub struct CheckpointStore {
    path: PathBuf,
    /// 串行化并发的保存，避免旧快照覆盖新快照
    write_lock: Mutex<()>,
}

impl CheckpointStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 读取断点；文件不存在返回 `Ok(None)`，内容无法解析或不满足不变量返回 `CorruptCheckpoint`。
    pub async fn load(&self) -> Result<Option<BlobDownload>, DownloadError> {
        let raw = match fs::read(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(DownloadError::ReadCheckpoint(e)),
        };

        let download: BlobDownload =
            serde_json::from_slice(&raw).map_err(|e| self.corrupt(e.to_string()))?;
        download.validate().map_err(|reason| self.corrupt(reason))?;

        Ok(Some(download))
    }

    /// 保存断点；`build` 在写锁内调用，保证落盘顺序与快照顺序一致。
    pub async fn save_with<F>(&self, build: F) -> Result<(), DownloadError>
    where
        F: FnOnce() -> BlobDownload,
    {
        let _guard = self.write_lock.lock().await;
        let mut download = build();
        download.updated_at = Some(Utc::now());
        self.write_atomic(&download).await?;
        tracing::debug!(
            path = %self.path.display(),
            completed = download.completed,
            total = download.total,
            "checkpoint saved"
        );
        Ok(())
    }

    pub async fn save(&self, download: &BlobDownload) -> Result<(), DownloadError> {
        self.save_with(|| download.clone()).await
    }

    /// 删除断点；文件本就不存在时视为成功。
    pub async fn remove(&self) -> Result<(), DownloadError> {
        let _guard = self.write_lock.lock().await;
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DownloadError::RemoveCheckpoint(e)),
        }
    }

    async fn write_atomic(&self, download: &BlobDownload) -> Result<(), DownloadError> {
        let encoded = serde_json::to_vec(download)?;
        let temp_path = self.temp_path();

        let mut file = fs::File::create(&temp_path)
            .await
            .map_err(DownloadError::WriteCheckpoint)?;
        file.write_all(&encoded)
            .await
            .map_err(DownloadError::WriteCheckpoint)?;
        file.sync_all()
            .await
            .map_err(DownloadError::WriteCheckpoint)?;
        drop(file);

        fs::rename(&temp_path, &self.path)
            .await
            .map_err(DownloadError::WriteCheckpoint)
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn corrupt(&self, reason: String) -> DownloadError {
        DownloadError::CorruptCheckpoint {
            path: self.path.clone(),
            reason,
        }
    }
}
