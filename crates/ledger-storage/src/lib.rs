pub mod downloader;
pub mod error;
pub mod file_store;

pub use downloader::SnapshotDownloader;
pub use error::SnapshotStoreError;
pub use file_store::{LocalSnapshotFileStore, SnapshotFileStore};
