//! 进行中下载表：digest → 正在进行的下载。
//!
//! 同一 digest 的第二个调用方不会再发起网络请求，而是成为「跟随者」，
//! 监听领头下载的进度直到其结束。表由应用持有并注入下载器，不是全局变量。

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio_util::sync::CancellationToken;

use crate::internal::states::unlock_reactive::UnlockReactiveProperty;

use super::download_error::DownloadError;
use super::download_status::DownloadStatus;
use super::progress_event::{ProgressEvent, ProgressFn};
use super::progress_tracker::InFlightState;

/// 一个正在进行的下载，由领头者与所有跟随者共享。
#[derive(Debug)]
pub struct InFlightDownload {
    digest: String,
    state: UnlockReactiveProperty<InFlightState>,
}

impl InFlightDownload {
    fn new(digest: &str) -> Self {
        Self {
            digest: digest.to_string(),
            state: UnlockReactiveProperty::new(InFlightState::default()),
        }
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// 可监听的进度与状态
    pub fn state(&self) -> UnlockReactiveProperty<InFlightState> {
        self.state.clone()
    }

    pub fn status(&self) -> DownloadStatus {
        self.state
            .map(|s| s.status.clone())
            .unwrap_or(DownloadStatus::Canceled)
    }

    /// 以跟随者身份等待下载结束，期间把进度转发给 `callback`。
    pub async fn follow(
        &self,
        callback: Option<&ProgressFn>,
        cancel: &CancellationToken,
    ) -> Result<(), DownloadError> {
        let mut watcher = self.state.watch();
        let mut current = watcher.borrow();
        let mut last_reported: Option<u64> = None;

        loop {
            let Some(state) = current else {
                return Err(self.failed("下载状态已关闭".to_string()));
            };

            // 总大小未知前不转发；之后只转发前进的值
            let known = state.total > 0 || state.status == DownloadStatus::Finished;
            let advanced = last_reported.is_none_or(|last| state.completed > last);
            if known && advanced {
                if let Some(callback) = callback {
                    callback(ProgressEvent::downloading(
                        &self.digest,
                        state.completed,
                        state.total,
                    ));
                }
                last_reported = Some(state.completed);
            }

            match state.status {
                DownloadStatus::Running => {}
                DownloadStatus::Finished => return Ok(()),
                DownloadStatus::Failed(message) => return Err(self.failed(message)),
                DownloadStatus::Canceled => return Err(self.failed("下载被取消".to_string())),
            }

            current = tokio::select! {
                _ = cancel.cancelled() => return Err(DownloadError::Cancelled),
                changed = watcher.changed() => changed.ok(),
            };
        }
    }

    fn failed(&self, message: String) -> DownloadError {
        DownloadError::InFlightFailed {
            digest: self.digest.clone(),
            message,
        }
    }
}

/// 注册结果：第一个调用方成为领头者，其余成为跟随者。
pub enum Registration {
    Leader(InFlightGuard),
    Follower(Arc<InFlightDownload>),
}

/// 进程内共享的进行中下载表，Clone 后指向同一张表。
#[derive(Debug, Clone, Default)]
pub struct InProgressRegistry {
    entries: Arc<Mutex<HashMap<String, Arc<InFlightDownload>>>>,
}

impl InProgressRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 登记一个 digest：表中已有则返回跟随者句柄，否则插入新条目并返回领头者守卫。
    pub fn register(&self, digest: &str) -> Registration {
        let mut entries = self.lock();
        if let Some(existing) = entries.get(digest) {
            return Registration::Follower(Arc::clone(existing));
        }

        let entry = Arc::new(InFlightDownload::new(digest));
        entries.insert(digest.to_string(), Arc::clone(&entry));
        Registration::Leader(InFlightGuard {
            registry: self.clone(),
            entry,
        })
    }

    pub fn get(&self, digest: &str) -> Option<Arc<InFlightDownload>> {
        self.lock().get(digest).cloned()
    }

    pub fn contains(&self, digest: &str) -> bool {
        self.lock().contains_key(digest)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// 只移除与 `entry` 为同一对象的条目，不误删之后新登记的下载。
    fn remove(&self, entry: &Arc<InFlightDownload>) {
        let mut entries = self.lock();
        if entries
            .get(entry.digest())
            .is_some_and(|current| Arc::ptr_eq(current, entry))
        {
            entries.remove(entry.digest());
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Arc<InFlightDownload>>> {
        self.entries.lock().unwrap_or_else(|poisoned| {
            tracing::error!("in-progress registry lock poisoned, recovering");
            poisoned.into_inner()
        })
    }
}

/// 领头者守卫：drop 时无条件移出登记表；若此时仍未写入终态，记为失败以释放跟随者。
pub struct InFlightGuard {
    registry: InProgressRegistry,
    entry: Arc<InFlightDownload>,
}

impl InFlightGuard {
    pub fn entry(&self) -> &Arc<InFlightDownload> {
        &self.entry
    }

    /// 按下载结果写入终态，然后释放守卫。
    pub fn finish(self, result: &Result<(), DownloadError>) {
        let status = match result {
            Ok(()) => DownloadStatus::Finished,
            Err(DownloadError::Cancelled) => DownloadStatus::Canceled,
            Err(e) => DownloadStatus::Failed(e.to_string()),
        };
        self.entry.state.update_field(|s| {
            if status == DownloadStatus::Finished {
                s.completed = s.total;
            }
            s.status = status;
            true
        });
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.entry.state.update_field(|s| {
            if s.status.is_terminal() {
                return false;
            }
            s.status = DownloadStatus::Failed("下载被中断".to_string());
            true
        });
        self.registry.remove(&self.entry);
    }
}
