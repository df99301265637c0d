pub mod blob_source;
pub mod http_registry_client;
pub mod registry_auth;
pub mod registry_request;

pub use blob_source::BlobSource;
pub use http_registry_client::HttpRegistryClient;
pub use registry_auth::RegistryAuth;
pub use registry_request::{ByteStream, RegistryRequest, RegistryResponse, RequestError};
