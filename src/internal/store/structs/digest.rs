use std::fmt;

use crate::internal::blob_download::structs::DownloadError;

/// 内容摘要：`<algorithm>:<hex>`，例如 `sha256:2af3b8...`。
///
/// 解析时同时接受 `<algorithm>-<hex>`（磁盘文件名形式），统一规整为冒号形式。
/// 只校验格式，不校验 hex 长度与具体算法。
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Digest {
    algorithm: String,
    hex: String,
}

impl Digest {
    pub fn parse(raw: &str) -> Result<Self, DownloadError> {
        let invalid = || DownloadError::InvalidDigest(raw.to_string());

        let (algorithm, hex) = raw
            .split_once(':')
            .or_else(|| raw.split_once('-'))
            .ok_or_else(invalid)?;

        if algorithm.is_empty()
            || !algorithm
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        {
            return Err(invalid());
        }
        if hex.is_empty() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }

        Ok(Self {
            algorithm: algorithm.to_string(),
            hex: hex.to_ascii_lowercase(),
        })
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn hex(&self) -> &str {
        &self.hex
    }

    /// 磁盘文件名形式：`sha256-<hex>`（冒号在部分文件系统上不合法）。
    pub fn file_name(&self) -> String {
        format!("{}-{}", self.algorithm, self.hex)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}
