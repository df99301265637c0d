//! 镜像仓库（registry）协作方：请求/响应模型、带认证的 HTTP 客户端、blob URL 构造。
//!
//! 下载器只依赖 [`traits::registry_client::RegistryClient`] 这一窄接口，
//! 生产环境用 [`structs::HttpRegistryClient`]，测试中可替换为脚本化实现。

pub mod structs;
pub mod traits;
