//! 响应式属性测试：基础读写、watch 监听、条件修改、关闭与销毁唤醒、并发写不丢更新。

use std::time::Duration;

use crate::download::{DownloadStatus, InFlightState};
use crate::states::unlock_reactive::{UnlockReactiveProperty, UnlockReactivePropertyError};

#[tokio::test]
async fn basic_update_and_read() {
    let prop = UnlockReactiveProperty::new(0u64);
    prop.update(42);
    assert_eq!(prop.get_current(), Some(42));

    assert!(prop.update_field(|v| {
        *v += 8;
        true
    }));
    assert_eq!(prop.get_current(), Some(50));
    assert_eq!(prop.map(|v| v * 2), Some(100));
    assert_eq!(*prop.get_current_borrow(), Some(50));
}

#[tokio::test]
async fn watch_receives_updates() {
    let prop = UnlockReactiveProperty::new(0i32);
    let mut watcher = prop.watch();

    prop.update(1);
    assert_eq!(watcher.changed().await.unwrap(), 1);

    prop.update(2);
    assert_eq!(watcher.changed().await.unwrap(), 2);
    assert_eq!(watcher.borrow(), Some(2));
}

#[tokio::test]
async fn unmodified_field_does_not_wake_watchers() {
    let prop = UnlockReactiveProperty::new(InFlightState::default());
    let mut watcher = prop.watch();

    assert!(!prop.update_field(|_| false));
    let woke = tokio::time::timeout(Duration::from_millis(50), watcher.changed()).await;
    assert!(woke.is_err(), "未修改时不应唤醒监听者");

    prop.update_field(|s| {
        s.status = DownloadStatus::Finished;
        true
    });
    let state = watcher.changed().await.unwrap();
    assert_eq!(state.status, DownloadStatus::Finished);
}

#[tokio::test]
async fn close_wakes_watchers_with_error() {
    let prop = UnlockReactiveProperty::new(1u8);
    let mut watcher = prop.watch();
    let p = prop.clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        p.close();
    });

    let err = watcher.changed().await.unwrap_err();
    assert!(matches!(err, UnlockReactivePropertyError::WatcherClosed));
    assert_eq!(prop.get_current(), None);
    // 关闭后的修改不生效
    assert!(!prop.update_field(|v| {
        *v = 2;
        true
    }));
}

#[tokio::test]
async fn dropping_all_writers_wakes_watchers() {
    let prop = UnlockReactiveProperty::new(1u8);
    let mut watcher = prop.watch();
    drop(prop);

    let err = watcher.changed().await.unwrap_err();
    assert!(matches!(err, UnlockReactivePropertyError::Destroyed));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_update_field_loses_nothing() {
    const TASKS: u64 = 8;
    const PER_TASK: u64 = 5_000;

    let prop = UnlockReactiveProperty::new(0u64);
    let mut handles = Vec::new();
    for _ in 0..TASKS {
        let p = prop.clone();
        handles.push(tokio::spawn(async move {
            for _ in 0..PER_TASK {
                p.update_field(|v| {
                    *v += 1;
                    true
                });
            }
        }));
    }
    for h in handles {
        h.await.unwrap();
    }
    assert_eq!(prop.get_current(), Some(TASKS * PER_TASK));
}
