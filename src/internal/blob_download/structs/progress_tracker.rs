//! 进度聚合：所有分片任务写盘后把字节数累加到同一个计数器，再通知调用方。

use std::sync::{Mutex, MutexGuard};

use crate::internal::states::unlock_reactive::UnlockReactiveProperty;

use super::download_status::DownloadStatus;
use super::progress_event::{ProgressEvent, ProgressFn};

/// 同一 digest 的进度快照，广播给 [`InProgressRegistry`](super::InProgressRegistry) 中的跟随者。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InFlightState {
    pub completed: u64,
    pub total: u64,
    pub status: DownloadStatus,
}

impl Default for InFlightState {
    fn default() -> Self {
        Self {
            completed: 0,
            total: 0,
            status: DownloadStatus::Running,
        }
    }
}

/// 字节计数拦截器，绑定一个 digest 与总大小。
///
/// 累加与回调在同一把锁内完成：并发分片下，回调看到的 `completed` 仍然单调不减。
pub struct ProgressTracker {
    digest: String,
    total: u64,
    completed: Mutex<u64>,
    callback: Option<ProgressFn>,
    state: UnlockReactiveProperty<InFlightState>,
}

impl ProgressTracker {
    /// `initial` 为续传时断点中已完成的字节数。
    pub fn new(
        digest: &str,
        total: u64,
        initial: u64,
        callback: Option<ProgressFn>,
        state: UnlockReactiveProperty<InFlightState>,
    ) -> Self {
        let initial = initial.min(total);
        state.update_field(|s| {
            s.total = total;
            s.completed = initial;
            true
        });
        Self {
            digest: digest.to_string(),
            total,
            completed: Mutex::new(initial),
            callback,
            state,
        }
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn completed(&self) -> u64 {
        *self.lock()
    }

    /// 记录新写入的 `n` 字节并通知回调，返回累加后的总量。
    pub fn add(&self, n: u64) -> u64 {
        if n == 0 {
            return self.completed();
        }
        let mut completed = self.lock();
        *completed = (*completed + n).min(self.total);
        let current = *completed;
        self.publish(current);
        current
    }

    /// 以当前值再通知一次（开始下载时告知调用方总大小）。
    pub fn report(&self) {
        let completed = self.lock();
        self.publish(*completed);
    }

    /// 全部分片完成：计数拉满到 `total` 并发出最后一个事件。
    pub fn finish(&self) {
        let mut completed = self.lock();
        *completed = self.total;
        self.publish(self.total);
    }

    fn publish(&self, completed: u64) {
        if let Some(callback) = &self.callback {
            callback(ProgressEvent::downloading(&self.digest, completed, self.total));
        }
        self.state.update_field(|s| {
            if completed <= s.completed && s.total == self.total {
                return false;
            }
            s.completed = completed;
            s.total = self.total;
            true
        });
    }

    fn lock(&self) -> MutexGuard<'_, u64> {
        self.completed.lock().unwrap_or_else(|poisoned| {
            tracing::error!(digest = %self.digest, "progress counter lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}
