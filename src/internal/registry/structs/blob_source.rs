use url::Url;

use crate::internal::blob_download::structs::DownloadError;
use crate::internal::store::structs::Digest;

/// blob 的远端来源：registry 根地址 + `namespace/repository`。
///
/// 由外部的模型名解析得到，下载器只用它拼出
/// `<base_url>/v2/<namespace>/<repository>/blobs/<digest>`。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlobSource {
    base_url: Url,
    repository: String,
}

impl BlobSource {
    pub fn new(base_url: &str, repository: &str) -> Result<Self, DownloadError> {
        let base_url =
            Url::parse(base_url).map_err(|e| DownloadError::InvalidSource(e.to_string()))?;
        if base_url.cannot_be_a_base() || !matches!(base_url.scheme(), "http" | "https") {
            return Err(DownloadError::InvalidSource(format!(
                "不支持的 registry 地址: {base_url}"
            )));
        }

        let repository = repository.trim_matches('/');
        if repository.is_empty() || repository.split('/').any(|s| s.is_empty() || s == "..") {
            return Err(DownloadError::InvalidSource(format!(
                "仓库路径非法: {repository}"
            )));
        }

        Ok(Self {
            base_url,
            repository: repository.to_string(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn repository(&self) -> &str {
        &self.repository
    }

    pub fn blob_url(&self, digest: &Digest) -> Url {
        let mut url = self.base_url.clone();
        // new() 已排除 cannot-be-a-base，这里总能拿到可变路径段
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .push("v2")
                .extend(self.repository.split('/'))
                .push("blobs")
                .push(&digest.to_string());
        }
        url
    }
}
