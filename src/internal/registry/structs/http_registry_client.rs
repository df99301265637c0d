use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::AUTHORIZATION;

use crate::internal::registry::traits::RegistryClient;

use super::registry_auth::RegistryAuth;
use super::registry_request::{RegistryRequest, RegistryResponse, RequestError};

/// 基于 reqwest 的 registry 客户端。
///
/// 关闭了自动 gzip 解压：Range 偏移基于 blob 原始字节，解压后的长度对不上。
#[derive(Clone, Debug)]
pub struct HttpRegistryClient {
    client: Client, // 内部是 Arc，clone 廉价
    auth: RegistryAuth,
}

impl HttpRegistryClient {
    pub fn new(auth: RegistryAuth) -> Result<Self, RequestError> {
        let client = Client::builder().no_gzip().build()?;
        Ok(Self { client, auth })
    }

    /// 复用调用方已配置好的 reqwest 客户端（代理、超时等）。
    pub fn with_client(client: Client, auth: RegistryAuth) -> Self {
        Self { client, auth }
    }

    pub fn auth(&self) -> &RegistryAuth {
        &self.auth
    }
}

#[async_trait]
impl RegistryClient for HttpRegistryClient {
    async fn send(&self, request: RegistryRequest) -> Result<RegistryResponse, RequestError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(value) = self.auth.authorization() {
            builder = builder.header(AUTHORIZATION, value.clone());
        }

        let resp = builder.send().await?;
        let status = resp.status();
        let headers = resp.headers().clone();
        let body = resp
            .bytes_stream()
            .map(|chunk| chunk.map_err(std::io::Error::other))
            .boxed();

        Ok(RegistryResponse::new(status, headers, body))
    }
}
