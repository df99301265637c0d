//! registry 请求的发送接口。

use async_trait::async_trait;

use crate::internal::registry::structs::{RegistryRequest, RegistryResponse, RequestError};

/// 发送（已签名的）registry 请求。
///
/// 实现方负责认证头、连接复用等细节；下载器只要求：
/// - 原样携带请求中的 `Range` 头；
/// - 返回真实的状态码（200 / 206 视为成功，其余由下载器判定为失败）。
#[async_trait]
pub trait RegistryClient: Send + Sync {
    async fn send(&self, request: RegistryRequest) -> Result<RegistryResponse, RequestError>;
}
