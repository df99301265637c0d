//! 内容寻址存储：digest 解析与 blob 本地路径解析。
//!
//! 相同 digest 永远映射到相同路径，下载器据此判断「已下载完成」以及放置断点文件。

pub mod structs;
