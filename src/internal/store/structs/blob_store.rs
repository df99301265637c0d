use std::env;
use std::path::{Path, PathBuf};

use super::digest::Digest;

/// 覆盖默认 blob 目录的环境变量
pub const BLOB_STORE_ENV: &str = "BLOB_FETCH_MODELS";

/// 断点文件相对 blob 文件追加的扩展名
const CHECKPOINT_SUFFIX: &str = ".json";

/// 内容寻址的 blob 目录。
///
/// 布局：`<root>/<algorithm>-<hex>` 为 blob 本体，同目录下 `<blob>.json` 为下载断点。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobStore {
    root: PathBuf,
}

impl BlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// 读取 `BLOB_FETCH_MODELS`，未设置时回退到 `~/.blob_fetch/models/blobs`。
    pub fn from_env() -> Self {
        if let Some(dir) = env::var_os(BLOB_STORE_ENV).filter(|v| !v.is_empty()) {
            return Self::new(PathBuf::from(dir).join("blobs"));
        }
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(home.join(".blob_fetch").join("models").join("blobs"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// digest → blob 路径；同一 digest 总得到同一路径。
    pub fn blob_path(&self, digest: &Digest) -> PathBuf {
        self.root.join(digest.file_name())
    }

    /// blob 对应的断点文件路径：`<blob_path>.json`。
    pub fn checkpoint_path(&self, digest: &Digest) -> PathBuf {
        let mut name = digest.file_name();
        name.push_str(CHECKPOINT_SUFFIX);
        self.root.join(name)
    }
}
