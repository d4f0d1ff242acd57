use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotStoreError {
    #[error("hash {0:?} is not a valid snapshot file name")]
    InvalidHash(String),
    #[error("no peer in {0:?} could supply the snapshot")]
    NoPeerAvailable(Vec<String>),
    #[error("filesystem error: {0}")]
    Io(#[from] std::io::Error),
}
