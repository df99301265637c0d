//! 分片下载：为每个未完成分片 spawn 任务，信号量限制并发，首个错误取消其余任务。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::internal::blob_download::structs::checkpoint::CheckpointStore;
use crate::internal::blob_download::structs::{DownloadError, ProgressTracker};
use crate::internal::registry::traits::RegistryClient;

use super::fetch_part::{FetchPartParams, fetch_part};
use super::part_ledger::PartLedger;

/// 运行全部分片任务时的参数（形参超过 3 个，用 struct 承载）。
pub(in crate::internal::blob_download) struct RunPartTasksParams {
    pub client: Arc<dyn RegistryClient>,
    pub url: Url,
    pub path: PathBuf,
    pub ledger: Arc<PartLedger>,
    pub tracker: Arc<ProgressTracker>,
    pub checkpoint: Arc<CheckpointStore>,
    pub max_concurrent: usize,
    pub max_retries: usize,
    pub retry_delay: Duration,
    /// 本次下载专用的取消令牌，任一分片失败时由这里取消
    pub token: CancellationToken,
}

/// 并发下载所有未完成分片，等待全部结束；返回第一个出现的错误。
///
/// 任务一次性 spawn，拿到信号量许可才真正发请求；失败的任务在释放许可前取消令牌，
/// 之后仍在排队的任务不会再发请求。
pub(in crate::internal::blob_download) async fn run_part_tasks(
    params: RunPartTasksParams,
) -> Result<(), DownloadError> {
    let semaphore = Arc::new(Semaphore::new(params.max_concurrent.max(1)));
    let mut tasks = JoinSet::new();

    for index in params.ledger.pending() {
        let sem = Arc::clone(&semaphore);
        let token = params.token.clone();
        let fetch_params = FetchPartParams {
            client: Arc::clone(&params.client),
            url: params.url.clone(),
            path: params.path.clone(),
            index,
            ledger: Arc::clone(&params.ledger),
            tracker: Arc::clone(&params.tracker),
            checkpoint: Arc::clone(&params.checkpoint),
            max_retries: params.max_retries,
            retry_delay: params.retry_delay,
            token: params.token.clone(),
        };

        tasks.spawn(async move {
            let _permit = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(DownloadError::Cancelled),
                permit = sem.acquire_owned() => permit.map_err(|_| {
                    DownloadError::ChunkedInternal("信号量已关闭".into())
                })?,
            };
            if token.is_cancelled() {
                return Err(DownloadError::Cancelled);
            }
            let result = fetch_part(fetch_params).await;
            // 持有许可时就取消，排队的任务拿到许可后一定能看到取消
            if result.is_err() {
                token.cancel();
            }
            result
        });
    }

    let mut first_error: Option<DownloadError> = None;
    while let Some(joined) = tasks.join_next().await {
        let outcome = match joined {
            Ok(result) => result,
            Err(join_err) => Err(DownloadError::TaskJoin(join_err)),
        };
        if let Err(e) = outcome {
            if first_error.is_none() {
                params.token.cancel();
                first_error = Some(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
