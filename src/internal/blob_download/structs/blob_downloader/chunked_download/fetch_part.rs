//! 分片下载：单个分片的完整生命周期——请求、流式写盘、进度累加、失败重试、完成后保存断点。

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::internal::blob_download::structs::checkpoint::CheckpointStore;
use crate::internal::blob_download::structs::{DownloadError, ProgressTracker};
use crate::internal::registry::traits::RegistryClient;

use super::offset_writer::OffsetWriter;
use super::part_ledger::{LivePart, PartLedger};
use super::range_request::{AttemptError, FetchRangeParams, fetch_range_response};

/// 下载单个分片时的参数（形参超过 3 个，用 struct 承载）。
pub(super) struct FetchPartParams {
    pub client: Arc<dyn RegistryClient>,
    pub url: Url,
    pub path: PathBuf,
    pub index: usize,
    pub ledger: Arc<PartLedger>,
    pub tracker: Arc<ProgressTracker>,
    pub checkpoint: Arc<CheckpointStore>,
    pub max_retries: usize,
    pub retry_delay: Duration,
    pub token: CancellationToken,
}

/// 下载一个分片（带重试和取消支持），成功后落盘并保存断点。
///
/// 每次重试都从分片当前的完成位置继续，而不是从分片起点重来。
pub(super) async fn fetch_part(params: FetchPartParams) -> Result<(), DownloadError> {
    let part = params.ledger.part(params.index);
    let mut attempts = 0usize;

    loop {
        if params.token.is_cancelled() {
            return Err(DownloadError::Cancelled);
        }
        attempts += 1;

        match fetch_part_once(&params, part).await {
            Ok(()) => break,
            Err(AttemptError::Fatal(e)) => return Err(e),
            Err(AttemptError::Transient(message)) => {
                if attempts > params.max_retries {
                    return Err(DownloadError::ChunkFailed {
                        offset: part.offset,
                        size: part.size,
                        attempts,
                        message,
                    });
                }

                tracing::warn!(
                    digest = %params.tracker.digest(),
                    offset = part.offset,
                    resume_at = part.next_offset(),
                    attempt = attempts,
                    "part download failed, retrying: {}",
                    message
                );

                tokio::select! {
                    _ = params.token.cancelled() => return Err(DownloadError::Cancelled),
                    _ = tokio::time::sleep(params.retry_delay) => {}
                }
            }
        }
    }

    let ledger = Arc::clone(&params.ledger);
    params.checkpoint.save_with(move || ledger.snapshot()).await?;

    tracing::debug!(
        digest = %params.tracker.digest(),
        offset = part.offset,
        size = part.size,
        attempts,
        "part completed"
    );
    Ok(())
}

/// 单次尝试：请求 `[next_offset, end)`，逐块写盘并推进分片与整体进度。
async fn fetch_part_once(params: &FetchPartParams, part: &LivePart) -> Result<(), AttemptError> {
    let start = part.next_offset();
    let end = part.end();
    if start >= end {
        return Ok(());
    }

    let response = fetch_range_response(FetchRangeParams {
        client: params.client.as_ref(),
        url: &params.url,
        start,
        end,
        total: params.tracker.total(),
        token: &params.token,
    })
    .await?;

    let mut writer = OffsetWriter::open(&params.path, start).await?;
    let mut body = response.body;

    while part.remaining() > 0 {
        let next = tokio::select! {
            biased;
            _ = params.token.cancelled() => {
                writer.sync().await?;
                part.mark_durable();
                return Err(DownloadError::Cancelled.into());
            }
            next = body.next() => next,
        };

        let chunk = match next {
            Some(Ok(chunk)) => chunk,
            Some(Err(e)) => {
                writer.sync().await?;
                part.mark_durable();
                return Err(AttemptError::Transient(format!("读取响应体失败: {e}")));
            }
            None => break,
        };

        // 多出分片范围的字节直接丢弃，不能写进相邻分片
        let take = (chunk.len() as u64).min(part.remaining()) as usize;
        if take == 0 {
            continue;
        }
        writer.write_all(&chunk[..take]).await?;
        part.advance(take as u64);
        params.tracker.add(take as u64);
    }

    writer.sync().await?;
    part.mark_durable();

    if part.remaining() > 0 {
        return Err(AttemptError::Transient(format!(
            "响应体提前结束，停在偏移 {}",
            writer.position()
        )));
    }
    Ok(())
}
