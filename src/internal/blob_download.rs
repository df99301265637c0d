//! Blob 分片下载：断点文件、进度聚合、进行中下载表与下载器本体。
//!
//! 入口是 [`structs::BlobDownloader::download_blob`]，其余类型是它的组成部分，
//! 单独导出便于调用方监听进度或在测试中直接操作断点文件。

pub mod structs;
