use core::fmt;
use std::sync::Arc;

use base64::Engine;
use reqwest::header::HeaderValue;
use sha2::{Digest, Sha256};

use super::registry_request::RequestError;

/// registry 认证信息
///
/// - 匿名、Basic、Bearer 三种形式，最终都折算成一个 `Authorization` 头；
/// - 默认 Eq 只比较令牌指纹，不保存可逆的明文副本；
/// - `Debug` 不输出任何凭据。
#[derive(Clone)]
pub struct RegistryAuth {
    authorization: Option<HeaderValue>,
    pub(crate) encrypted_token: Arc<String>, // 对外不可直接访问，哪怕它是摘要
}

impl RegistryAuth {
    /// 匿名访问（公开仓库）。
    pub fn anonymous() -> Self {
        Self {
            authorization: None,
            encrypted_token: Arc::new(String::new()),
        }
    }

    /// `Authorization: Basic base64(username:password)`
    pub fn basic(username: &str, password: &str) -> Result<Self, RequestError> {
        let token = base64::engine::general_purpose::STANDARD
            .encode(format!("{username}:{password}"));
        Self::from_scheme("Basic", &token)
    }

    /// `Authorization: Bearer <token>`
    pub fn bearer(token: &str) -> Result<Self, RequestError> {
        if token.is_empty() {
            return Err(RequestError::InvalidAuth("令牌为空".to_string()));
        }
        Self::from_scheme("Bearer", token)
    }

    fn from_scheme(scheme: &str, token: &str) -> Result<Self, RequestError> {
        let mut value = HeaderValue::from_str(&format!("{scheme} {token}"))
            .map_err(|e| RequestError::InvalidAuth(e.to_string()))?;
        value.set_sensitive(true);

        Ok(Self {
            authorization: Some(value),
            encrypted_token: Arc::new(Self::encrypt_str(token)),
        })
    }

    fn encrypt_str(data: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    /// 需要附加到每个请求上的 `Authorization` 头；匿名时为 `None`。
    pub fn authorization(&self) -> Option<&HeaderValue> {
        self.authorization.as_ref()
    }

    pub fn is_anonymous(&self) -> bool {
        self.authorization.is_none()
    }
}

impl PartialEq for RegistryAuth {
    fn eq(&self, other: &Self) -> bool {
        self.encrypted_token == other.encrypted_token
            && self.is_anonymous() == other.is_anonymous()
    }
}

/// 防止 debug 泄漏账号
impl fmt::Debug for RegistryAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistryAuth")
            .field("anonymous", &self.is_anonymous())
            .field("authorization", &"<hidden>")
            .finish()
    }
}
