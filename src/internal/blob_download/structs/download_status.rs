/// 下载状态（由下载器内部维护，外部只读监听）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadStatus {
    Running,
    Finished,
    Failed(String),
    Canceled,
}

impl DownloadStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, DownloadStatus::Running)
    }
}
