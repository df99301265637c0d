pub mod blob_store;
pub mod digest;

pub use blob_store::BlobStore;
pub use digest::Digest;
