pub mod client;
pub mod peer_directory;
pub mod reputation;

pub use client::{HttpPeerClient, PeerClient};
pub use peer_directory::{PeerDirectory, StaticPeerDirectory};
pub use reputation::{PeerReputation, ReputationTracker};
