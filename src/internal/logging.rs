//! 日志初始化：库内部只用 `tracing` 宏打点，是否输出、输出到哪由应用决定。
//!
//! 应用没有自己的 subscriber 时，可以调用这里的函数输出到 stderr；
//! 过滤规则优先读 `RUST_LOG`，否则用 [`DEFAULT_LOG_FILTER`]。

use tracing_subscriber::EnvFilter;

/// 默认过滤规则
pub const DEFAULT_LOG_FILTER: &str = "info,blob_fetch=debug";

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// 安装全局 subscriber；已经安装过时返回错误，不会 panic。
pub fn try_init_logging() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .try_init()?;
    tracing::debug!("blob_fetch logging initialized");
    Ok(())
}

/// 同 [`try_init_logging`]，忽略「已经安装过」的错误。
pub fn init_logging() {
    let _ = try_init_logging();
}
