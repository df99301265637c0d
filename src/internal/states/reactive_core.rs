//! # ReactiveProperty — 响应式属性内核
//!
//! 基于 [`tokio::sync::watch`] 的单值广播容器：写端 `update` / `update_field`，
//! 读端 `watch()` 后 `changed().await`。下载器用它把同一 digest 的进度与终态
//! 广播给所有跟随者（见 `InProgressRegistry`）。
//!
//! 所有写端（即全部 `ReactiveProperty` 克隆）被销毁后，监听器的 `changed()`
//! 返回 [`ReactivePropertyError::Destroyed`]，不会永久挂起。

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::watch;
use tokio::sync::watch::Ref;

// ──────────────────────────── Error ────────────────────────────

/// 响应式属性统一错误类型
#[derive(Debug, Error)]
pub enum ReactivePropertyError {
    /// 值已被显式清空（`close` 之后）
    #[error("监听器已被销毁")]
    WatcherClosed,

    /// 属性的所有写端都已销毁
    #[error("属性已被销毁")]
    Destroyed,
}

// ──────────────────────────── ReactiveProperty ────────────────────────────

/// 响应式属性内核：new / update / update_field / get_current / watch。
///
/// 可廉价 Clone，所有克隆共享同一个值。
#[derive(Debug)]
pub struct ReactiveProperty<T> {
    sender: Arc<watch::Sender<Option<T>>>,
}

impl<T> Clone for ReactiveProperty<T> {
    fn clone(&self) -> Self {
        Self {
            sender: Arc::clone(&self.sender),
        }
    }
}

impl<T> ReactiveProperty<T>
where
    T: Clone + Send + Sync,
{
    /// 创建一个新的响应式属性。
    pub fn new(value: T) -> Self {
        let (sender, _) = watch::channel(Some(value));
        Self {
            sender: Arc::new(sender),
        }
    }

    /// 整体替换属性值，所有监听者都会收到通知。
    pub fn update(&self, new_value: T) {
        self.sender.send_replace(Some(new_value));
    }

    /// 在 watch 内部锁下原地修改当前值；闭包返回 `false` 时不通知监听者。
    ///
    /// 读-改-写在同一把锁内完成，并发调用之间不会丢失更新。
    pub fn update_field<F>(&self, updater: F) -> bool
    where
        F: FnOnce(&mut T) -> bool,
    {
        self.sender.send_if_modified(|slot| match slot.as_mut() {
            Some(value) => updater(value),
            None => false,
        })
    }

    /// 清空值并唤醒所有监听者，之后的 `changed()` 返回 `WatcherClosed`。
    pub fn close(&self) {
        self.sender.send_replace(None);
    }

    /// 获取当前值的快照（会 clone）；已 `close` 时返回 `None`。
    pub fn get_current(&self) -> Option<T> {
        self.sender.borrow().as_ref().cloned()
    }

    /// 获取当前值的只读借用（零拷贝），持有期间会阻塞写端，勿跨 await 持有。
    pub fn get_current_borrow(&self) -> Ref<'_, Option<T>> {
        self.sender.borrow()
    }

    /// 对当前值应用转换函数。
    pub fn map<R, F>(&self, f: F) -> Option<R>
    where
        F: FnOnce(&T) -> R,
    {
        self.sender.borrow().as_ref().map(f)
    }

    /// 创建一个监听器，用于异步监听属性值的变化。
    pub fn watch(&self) -> PropertyWatcher<T> {
        PropertyWatcher {
            receiver: self.sender.subscribe(),
        }
    }
}

// ──────────────────────────── PropertyWatcher ────────────────────────────

/// 属性监听器，用于异步接收属性值的变化。
///
/// 新建的监听器把创建时的值视为「已读」，只有之后的更新才会让 `changed()` 返回。
pub struct PropertyWatcher<T> {
    receiver: watch::Receiver<Option<T>>,
}

impl<T> PropertyWatcher<T>
where
    T: Clone + Send + Sync,
{
    /// 异步等待属性值的变化，返回新值。
    pub async fn changed(&mut self) -> Result<T, ReactivePropertyError> {
        self.receiver
            .changed()
            .await
            .map_err(|_| ReactivePropertyError::Destroyed)?;
        match self.receiver.borrow_and_update().as_ref() {
            None => Err(ReactivePropertyError::WatcherClosed),
            Some(value) => Ok(value.clone()),
        }
    }

    /// 同步获取当前值的克隆，并标记为已读。
    pub fn borrow(&mut self) -> Option<T> {
        self.receiver.borrow_and_update().clone()
    }
}
