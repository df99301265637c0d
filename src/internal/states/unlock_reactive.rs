//! # UnlockReactiveProperty
//!
//! 下载进度这类高频更新场景使用的响应式属性：读写都不阻塞异步任务，
//! 内部直接复用 [`super::reactive_core::ReactiveProperty`]。
//!
//! ## 使用示例
//! ```rust,no_run
//! use blob_fetch::states::unlock_reactive::UnlockReactiveProperty;
//!
//! let prop = UnlockReactiveProperty::new(0u64);
//! prop.update(1);
//! prop.update_field(|v| { *v += 1; true });
//! assert_eq!(prop.get_current(), Some(2));
//! ```

pub use super::reactive_core::{PropertyWatcher, ReactivePropertyError as UnlockReactivePropertyError};

/// 轻量级响应式属性容器（无条件等待能力）。
pub type UnlockReactiveProperty<T> = super::reactive_core::ReactiveProperty<T>;
