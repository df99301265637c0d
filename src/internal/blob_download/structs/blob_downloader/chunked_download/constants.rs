//! 分片下载常量与工具。

/// 生成单个 Range 请求头：`bytes=start-(end-1)`，end 为不含上界。
pub(super) fn range_header(start: u64, end: u64) -> String {
    let end_inclusive = end.saturating_sub(1);
    format!("bytes={}-{}", start, end_inclusive)
}
