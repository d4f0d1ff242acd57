pub mod error;
pub mod keyed_store;
pub mod lifecycle;
pub mod lock_registry;
pub mod mempool;
pub mod merkle_pool;

pub use error::StoreError;
pub use keyed_store::KeyedStore;
pub use lifecycle::ConsensusLifecycleStore;
pub use lock_registry::LockRegistry;
pub use mempool::PendingMemPool;
pub use merkle_pool::MerklePool;
