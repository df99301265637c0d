//! 分片下载：构造并发起单段 Range 请求，校验状态码。

use reqwest::StatusCode;
use reqwest::header::{HeaderValue, RANGE};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::internal::blob_download::structs::DownloadError;
use crate::internal::registry::structs::{RegistryRequest, RegistryResponse};
use crate::internal::registry::traits::RegistryClient;

use super::constants::range_header;

/// 单次尝试的失败：可重试的网络类错误，或必须立即上抛的错误。
#[derive(Debug)]
pub(super) enum AttemptError {
    Transient(String),
    Fatal(DownloadError),
}

impl From<DownloadError> for AttemptError {
    fn from(e: DownloadError) -> Self {
        AttemptError::Fatal(e)
    }
}

/// 发起 Range 请求时的参数（形参超过 3 个时用 struct 承载）。
pub(super) struct FetchRangeParams<'a> {
    pub client: &'a dyn RegistryClient,
    pub url: &'a Url,
    /// 起点（含）
    pub start: u64,
    /// 终点（不含）
    pub end: u64,
    pub total: u64,
    pub token: &'a CancellationToken,
}

/// 发起单段 Range GET，返回状态码已校验的响应供调用方流式读取。
pub(super) async fn fetch_range_response(
    params: FetchRangeParams<'_>,
) -> Result<RegistryResponse, AttemptError> {
    let range = range_header(params.start, params.end);
    let value = HeaderValue::from_str(&range)
        .map_err(|e| DownloadError::ChunkedInternal(e.to_string()))?;
    let request = RegistryRequest::get(params.url.clone()).with_header(RANGE, value);

    let response = tokio::select! {
        _ = params.token.cancelled() => return Err(DownloadError::Cancelled.into()),
        sent = params.client.send(request) => {
            sent.map_err(|e| AttemptError::Transient(e.to_string()))?
        }
    };

    match response.status {
        StatusCode::PARTIAL_CONTENT => Ok(response),
        // 服务端忽略了 Range：只有恰好请求整个 blob 时才能直接使用
        StatusCode::OK if params.start == 0 && params.end == params.total => Ok(response),
        StatusCode::OK => Err(DownloadError::RangeNotSupported.into()),
        status => Err(AttemptError::Transient(format!("服务端返回 {status}"))),
    }
}
