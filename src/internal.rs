pub mod blob_download;
pub mod logging;
pub mod registry;
pub mod states;
pub mod store;
