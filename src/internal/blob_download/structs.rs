pub mod blob_download;
pub mod blob_downloader;
pub mod checkpoint;
pub mod download_config;
pub mod download_error;
pub mod download_status;
pub mod in_progress_registry;
pub mod progress_event;
pub mod progress_tracker;

pub use blob_download::{BlobDownload, BlobDownloadPart, partition};
pub use blob_downloader::{BlobDownloader, download_blob};
pub use checkpoint::CheckpointStore;
pub use download_config::{
    DEFAULT_MAX_CONCURRENT_PARTS, DEFAULT_MAX_RETRIES, DEFAULT_PART_SIZE, DEFAULT_RETRY_DELAY,
    DownloadConfig, DownloadOptions,
};
pub use download_error::{DownloadError, DownloadErrorKind};
pub use download_status::DownloadStatus;
pub use in_progress_registry::{InFlightDownload, InFlightGuard, InProgressRegistry, Registration};
pub use progress_event::{ProgressEvent, ProgressFn};
pub use progress_tracker::{InFlightState, ProgressTracker};
