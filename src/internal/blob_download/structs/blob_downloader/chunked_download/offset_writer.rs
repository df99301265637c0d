//! 定位写入器：每个分片任务独立打开目标文件，从自己的偏移开始顺序写。
//!
//! 各分片区间互不重叠、文件已预分配，所以不同任务之间不需要加锁。

use std::io::SeekFrom;
use std::path::Path;

use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncSeekExt, AsyncWriteExt};

use crate::internal::blob_download::structs::DownloadError;

pub(super) struct OffsetWriter {
    file: File,
    position: u64,
}

impl OffsetWriter {
    pub(super) async fn open(path: &Path, offset: u64) -> Result<Self, DownloadError> {
        let mut file = OpenOptions::new()
            .write(true)
            .open(path)
            .await
            .map_err(DownloadError::CreateFile)?;
        file.seek(SeekFrom::Start(offset))
            .await
            .map_err(DownloadError::SeekFile)?;
        Ok(Self {
            file,
            position: offset,
        })
    }

    pub(super) async fn write_all(&mut self, buf: &[u8]) -> Result<(), DownloadError> {
        self.file
            .write_all(buf)
            .await
            .map_err(DownloadError::WriteFile)?;
        self.position += buf.len() as u64;
        Ok(())
    }

    /// 刷新 tokio 的写缓冲并落盘；成功后分片才能前移已落盘的计数
    pub(super) async fn sync(&mut self) -> Result<(), DownloadError> {
        self.file.flush().await.map_err(DownloadError::FlushFile)?;
        self.file.sync_data().await.map_err(DownloadError::FlushFile)
    }

    pub(super) fn position(&self) -> u64 {
        self.position
    }
}
