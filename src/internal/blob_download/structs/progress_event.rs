use std::sync::Arc;

/// 进度回调
pub type ProgressFn = Arc<dyn Fn(ProgressEvent) + Send + Sync>;

/// 交给调用方的进度事件。
///
/// 同一次下载内 `completed` 单调不减，最后一个事件满足 `completed == total`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressEvent {
    /// 形如 `downloading sha256:...`
    pub status: String,
    pub digest: String,
    pub completed: u64,
    pub total: u64,
}

impl ProgressEvent {
    pub fn downloading(digest: &str, completed: u64, total: u64) -> Self {
        Self {
            status: format!("downloading {digest}"),
            digest: digest.to_string(),
            completed,
            total,
        }
    }

    /// 进度百分比（0～100）；总大小为 0 时返回 100。
    pub fn pct(&self) -> f64 {
        if self.total == 0 {
            return 100.0;
        }
        (self.completed as f64 / self.total as f64) * 100.0
    }
}
