//! 断点数据模型：一个 blob 的分片划分与各分片完成量。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// blob 的一段连续字节区间 `[offset, offset + size)`。
///
/// `offset` / `size` 在划分时确定，之后只有 `completed` 会增长。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobDownloadPart {
    pub offset: u64,
    pub size: u64,
    /// 本分片已写入的字节数，`0 <= completed <= size`
    pub completed: u64,
}

impl BlobDownloadPart {
    pub fn new(offset: u64, size: u64) -> Self {
        Self {
            offset,
            size,
            completed: 0,
        }
    }

    /// 不含上界
    pub fn end(&self) -> u64 {
        self.offset + self.size
    }

    pub fn is_done(&self) -> bool {
        self.completed == self.size
    }
}

/// 一个 digest 的下载断点，序列化后保存在 `<blob>.json`。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BlobDownload {
    pub total: u64,
    pub completed: u64,
    pub parts: Vec<BlobDownloadPart>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl BlobDownload {
    /// 按 `part_size` 把 `[0, total)` 切成连续分片，最后一片取余数。
    pub fn partitioned(total: u64, part_size: u64) -> Self {
        Self {
            total,
            completed: 0,
            parts: partition(total, part_size),
            updated_at: None,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completed == self.total && self.parts.iter().all(BlobDownloadPart::is_done)
    }

    /// 尚未完成的分片
    pub fn pending_parts(&self) -> impl Iterator<Item = &BlobDownloadPart> {
        self.parts.iter().filter(|p| !p.is_done())
    }

    /// 本地数据丢失时清零所有进度，保留原有划分。
    pub fn reset_progress(&mut self) {
        for part in &mut self.parts {
            part.completed = 0;
        }
        self.completed = 0;
    }

    /// 校验分片不变量：从 0 开始首尾相接、覆盖 `[0, total)`，
    /// 每片 `completed <= size`，且 `completed` 等于各片之和。
    pub fn validate(&self) -> Result<(), String> {
        let mut expected_offset = 0u64;
        let mut completed_sum = 0u64;

        for (index, part) in self.parts.iter().enumerate() {
            if part.offset != expected_offset {
                return Err(format!(
                    "分片 {index} 偏移 {} 与预期 {expected_offset} 不连续",
                    part.offset
                ));
            }
            if part.size == 0 {
                return Err(format!("分片 {index} 大小为 0"));
            }
            if part.completed > part.size {
                return Err(format!(
                    "分片 {index} 已完成 {} 超过大小 {}",
                    part.completed, part.size
                ));
            }
            expected_offset = expected_offset
                .checked_add(part.size)
                .ok_or_else(|| format!("分片 {index} 结束位置溢出"))?;
            completed_sum += part.completed;
        }

        if expected_offset != self.total {
            return Err(format!(
                "分片合计 {expected_offset} 字节，与总大小 {} 不符",
                self.total
            ));
        }
        if completed_sum != self.completed {
            return Err(format!(
                "已完成字节 {} 与各分片之和 {completed_sum} 不符",
                self.completed
            ));
        }
        Ok(())
    }
}

/// 把 `[0, total)` 切成大小为 `part_size` 的连续分片；`total == 0` 时为空。
pub fn partition(total: u64, part_size: u64) -> Vec<BlobDownloadPart> {
    let part_size = part_size.max(1);
    let mut parts = Vec::with_capacity(total.div_ceil(part_size) as usize);
    let mut offset = 0u64;
    while offset < total {
        let size = part_size.min(total - offset);
        parts.push(BlobDownloadPart::new(offset, size));
        offset += size;
    }
    parts
}
