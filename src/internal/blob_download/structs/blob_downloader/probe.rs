//! 元数据探测：HEAD 请求获知 blob 总大小。

use url::Url;

use crate::internal::blob_download::structs::DownloadError;
use crate::internal::registry::structs::RegistryRequest;
use crate::internal::registry::traits::RegistryClient;

/// 发 HEAD 请求，返回 `Content-Length`。
///
/// 缺少或无法解析 `Content-Length` 视为错误，不会按 0 字节处理。
pub(super) async fn probe_total(client: &dyn RegistryClient, url: &Url) -> Result<u64, DownloadError> {
    let response = client
        .send(RegistryRequest::head(url.clone()))
        .await
        .map_err(|source| DownloadError::ProbeFailed {
            url: url.to_string(),
            source,
        })?;

    if !response.status.is_success() {
        return Err(DownloadError::ProbeStatus {
            url: url.to_string(),
            status: response.status.as_u16(),
        });
    }

    response
        .content_length()
        .ok_or_else(|| DownloadError::MissingContentLength(url.to_string()))
}
