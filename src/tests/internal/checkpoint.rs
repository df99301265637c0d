//! 断点文件：读写、原子替换、损坏检测、删除。

use crate::download::{BlobDownload, CheckpointStore, DownloadError, DownloadErrorKind};

#[tokio::test]
async fn load_missing_checkpoint_returns_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("sha256-00.json"));
    assert!(store.load().await.unwrap().is_none());
}

#[tokio::test]
async fn save_then_load_keeps_per_part_progress() {
    let dir = tempfile::tempdir().unwrap();
    let store = CheckpointStore::new(dir.path().join("sha256-00.json"));

    let mut download = BlobDownload::partitioned(1000, 300);
    download.parts[1].completed = 120;
    download.parts[3].completed = 100;
    download.completed = 220;
    store.save(&download).await.unwrap();

    let loaded = store.load().await.unwrap().unwrap();
    assert_eq!(loaded.total, 1000);
    assert_eq!(loaded.completed, 220);
    assert_eq!(loaded.parts, download.parts);
    assert!(loaded.updated_at.is_some());

    // 临时文件已被 rename 掉
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[tokio::test]
async fn checkpoint_is_plain_json() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sha256-00.json");
    let store = CheckpointStore::new(&path);
    store.save(&BlobDownload::partitioned(10, 4)).await.unwrap();

    let value: serde_json::Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
    assert_eq!(value["total"], 10);
    assert_eq!(value["completed"], 0);
    assert_eq!(value["parts"].as_array().unwrap().len(), 3);
    assert_eq!(value["parts"][2]["offset"], 8);
    assert_eq!(value["parts"][2]["size"], 2);
}

#[tokio::test]
async fn unparsable_checkpoint_is_reported_as_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sha256-00.json");
    std::fs::write(&path, b"{\"total\": 10, \"parts\": [").unwrap();

    let err = CheckpointStore::new(&path).load().await.unwrap_err();
    assert!(matches!(err, DownloadError::CorruptCheckpoint { .. }));
    assert_eq!(err.kind(), DownloadErrorKind::CorruptCheckpoint);
    // 损坏的文件原样保留，不会被悄悄删除
    assert!(path.exists());
}

#[tokio::test]
async fn inconsistent_checkpoint_is_reported_as_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sha256-00.json");
    std::fs::write(
        &path,
        br#"{"total":10,"completed":3,"parts":[{"offset":0,"size":4,"completed":3},{"offset":5,"size":5,"completed":0}]}"#,
    )
    .unwrap();

    let err = CheckpointStore::new(&path).load().await.unwrap_err();
    assert!(matches!(err, DownloadError::CorruptCheckpoint { .. }));
}

#[tokio::test]
async fn remove_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("sha256-00.json");
    let store = CheckpointStore::new(&path);
    store.save(&BlobDownload::partitioned(10, 4)).await.unwrap();
    assert!(path.exists());

    store.remove().await.unwrap();
    assert!(!path.exists());
    store.remove().await.unwrap();
}

#[tokio::test]
async fn save_with_builds_snapshot_under_lock() {
    let dir = tempfile::tempdir().unwrap();
    let store = std::sync::Arc::new(CheckpointStore::new(dir.path().join("sha256-00.json")));

    let mut handles = Vec::new();
    for done in 1..=8u64 {
        let store = std::sync::Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store
                .save_with(move || {
                    let mut d = BlobDownload::partitioned(8, 1);
                    for part in d.parts.iter_mut().take(done as usize) {
                        part.completed = 1;
                    }
                    d.completed = done;
                    d
                })
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let loaded = store.load().await.unwrap().unwrap();
    assert!(loaded.validate().is_ok());
}
