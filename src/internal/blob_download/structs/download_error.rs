//! 下载相关错误类型。

use std::path::PathBuf;

use thiserror::Error;

use crate::internal::registry::structs::RequestError;

/// 错误大类，供调用方决定是否重试整个下载。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadErrorKind {
    /// 调用参数不合法（digest、registry 地址）
    InvalidInput,
    /// 无法通过 HEAD 获知 blob 大小
    ProbeFailed,
    /// 断点文件无法解析或不满足分片不变量
    CorruptCheckpoint,
    /// 某个分片用尽重试次数，或服务端不支持 Range
    ChunkFetchFailed,
    /// 本地文件分配 / 写入 / 断点读写失败
    LocalIoFailed,
    /// 调用方取消，或兄弟分片失败导致取消
    Canceled,
    /// 任务调度等内部错误
    Internal,
}

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("digest 格式非法: {0}")]
    InvalidDigest(String),

    #[error("registry 地址非法: {0}")]
    InvalidSource(String),

    #[error("获取 blob 大小失败 ({url}): {source}")]
    ProbeFailed {
        url: String,
        #[source]
        source: RequestError,
    },

    #[error("获取 blob 大小失败 ({url}): 服务端返回 {status}")]
    ProbeStatus { url: String, status: u16 },

    #[error("HEAD 响应缺少有效的 Content-Length: {0}")]
    MissingContentLength(String),

    #[error("断点文件损坏 {}: {reason}", path.display())]
    CorruptCheckpoint { path: PathBuf, reason: String },

    #[error("分片 [{offset}, +{size}) 下载失败，已尝试 {attempts} 次: {message}")]
    ChunkFailed {
        offset: u64,
        size: u64,
        attempts: usize,
        message: String,
    },

    #[error("服务器不支持 Range 请求")]
    RangeNotSupported,

    #[error("读取文件信息失败: {0}")]
    StatFile(std::io::Error),

    #[error("创建文件失败: {0}")]
    CreateFile(std::io::Error),

    #[error("预分配文件空间失败: {0}")]
    PreallocateFile(std::io::Error),

    #[error("文件定位失败: {0}")]
    SeekFile(std::io::Error),

    #[error("写入文件失败: {0}")]
    WriteFile(std::io::Error),

    #[error("刷新文件失败: {0}")]
    FlushFile(std::io::Error),

    #[error("读取断点文件失败: {0}")]
    ReadCheckpoint(std::io::Error),

    #[error("写入断点文件失败: {0}")]
    WriteCheckpoint(std::io::Error),

    #[error("序列化断点失败: {0}")]
    EncodeCheckpoint(#[from] serde_json::Error),

    #[error("删除断点文件失败: {0}")]
    RemoveCheckpoint(std::io::Error),

    #[error("下载被取消")]
    Cancelled,

    #[error("分片任务失败: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),

    #[error("分片下载内部错误: {0}")]
    ChunkedInternal(String),

    /// 跟随的同 digest 下载以失败告终。
    #[error("同一 blob 的并发下载失败 ({digest}): {message}")]
    InFlightFailed { digest: String, message: String },
}

impl DownloadError {
    pub fn kind(&self) -> DownloadErrorKind {
        match self {
            Self::InvalidDigest(_) | Self::InvalidSource(_) => DownloadErrorKind::InvalidInput,
            Self::ProbeFailed { .. } | Self::ProbeStatus { .. } | Self::MissingContentLength(_) => {
                DownloadErrorKind::ProbeFailed
            }
            Self::CorruptCheckpoint { .. } => DownloadErrorKind::CorruptCheckpoint,
            Self::ChunkFailed { .. } | Self::RangeNotSupported | Self::InFlightFailed { .. } => {
                DownloadErrorKind::ChunkFetchFailed
            }
            Self::StatFile(_)
            | Self::CreateFile(_)
            | Self::PreallocateFile(_)
            | Self::SeekFile(_)
            | Self::WriteFile(_)
            | Self::FlushFile(_)
            | Self::ReadCheckpoint(_)
            | Self::WriteCheckpoint(_)
            | Self::EncodeCheckpoint(_)
            | Self::RemoveCheckpoint(_) => DownloadErrorKind::LocalIoFailed,
            Self::Cancelled => DownloadErrorKind::Canceled,
            Self::TaskJoin(_) | Self::ChunkedInternal(_) => DownloadErrorKind::Internal,
        }
    }
}
