//! 运行期的分片账本：每个分片有两个原子计数，由唯一负责它的任务推进。
//!
//! `completed` 是已交给写入器的字节，决定续传位置和进度；`durable` 只在 `sync_data`
//! 之后才前移，保存断点时取的是它的快照。

use std::sync::atomic::{AtomicU64, Ordering};

use crate::internal::blob_download::structs::{BlobDownload, BlobDownloadPart};

#[derive(Debug)]
pub(crate) struct LivePart {
    pub(crate) offset: u64,
    pub(crate) size: u64,
    completed: AtomicU64,
    /// 已确认落盘的字节数，不超过 `completed`
    durable: AtomicU64,
}

impl LivePart {
    pub(crate) fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    pub(crate) fn advance(&self, n: u64) {
        self.completed.fetch_add(n, Ordering::AcqRel);
    }

    /// 分片写入器 `sync` 成功后调用，把已落盘的量追平到当前完成量
    pub(crate) fn mark_durable(&self) {
        self.durable.fetch_max(self.completed(), Ordering::AcqRel);
    }

    pub(crate) fn durable(&self) -> u64 {
        self.durable.load(Ordering::Acquire)
    }

    /// 下一次请求的起点（续传位置）
    pub(crate) fn next_offset(&self) -> u64 {
        self.offset + self.completed()
    }

    /// 不含上界
    pub(crate) fn end(&self) -> u64 {
        self.offset + self.size
    }

    pub(crate) fn remaining(&self) -> u64 {
        self.size.saturating_sub(self.completed())
    }

    pub(crate) fn is_done(&self) -> bool {
        self.completed() >= self.size
    }
}

#[derive(Debug)]
pub(crate) struct PartLedger {
    total: u64,
    parts: Vec<LivePart>,
}

impl PartLedger {
    pub(crate) fn new(download: &BlobDownload) -> Self {
        let parts = download
            .parts
            .iter()
            .map(|p| LivePart {
                offset: p.offset,
                size: p.size,
                completed: AtomicU64::new(p.completed),
                durable: AtomicU64::new(p.completed),
            })
            .collect();
        Self {
            total: download.total,
            parts,
        }
    }

    pub(crate) fn part(&self, index: usize) -> &LivePart {
        &self.parts[index]
    }

    /// 未完成分片的下标，按偏移升序
    pub(crate) fn pending(&self) -> Vec<usize> {
        self.parts
            .iter()
            .enumerate()
            .filter(|(_, p)| !p.is_done())
            .map(|(i, _)| i)
            .collect()
    }

    pub(crate) fn completed(&self) -> u64 {
        self.parts.iter().map(LivePart::completed).sum()
    }

    pub(crate) fn is_complete(&self) -> bool {
        self.parts.iter().all(LivePart::is_done)
    }

    /// 断点快照：只记录已落盘的字节，其他分片写进缓冲但还没 sync 的部分不算
    pub(crate) fn snapshot(&self) -> BlobDownload {
        let parts: Vec<BlobDownloadPart> = self
            .parts
            .iter()
            .map(|p| BlobDownloadPart {
                offset: p.offset,
                size: p.size,
                completed: p.durable().min(p.size),
            })
            .collect();
        BlobDownload {
            total: self.total,
            completed: parts.iter().map(|p| p.completed).sum(),
            parts,
            updated_at: None,
        }
    }
}
