use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ledger_core::{PeerId, RecentSnapshot, SnapshotCreated, SnapshotVerification};
use tracing::warn;

use crate::peer_directory::PeerDirectory;
use crate::reputation::ReputationTracker;

const PEER_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// The two outbound calls the broadcast/verify loop (C9) makes against a
/// peer. Failures are reported as `None` rather than propagated — a single
/// unreachable peer should never stall a health-check or broadcast round.
#[async_trait]
pub trait PeerClient: Send + Sync {
    async fn verify_snapshot(
        &self,
        peer: &PeerId,
        created: &SnapshotCreated,
    ) -> Option<SnapshotVerification>;

    async fn recent_snapshots(&self, peer: &PeerId) -> Option<Vec<RecentSnapshot>>;
}

/// `reqwest`-backed peer client. Every outbound call carries a 5 second
/// timeout; a peer that doesn't answer in time is treated the same as one
/// that answered with an error.
pub struct HttpPeerClient {
    directory: Arc<dyn PeerDirectory>,
    reputation: Arc<ReputationTracker>,
    client: reqwest::Client,
}

impl HttpPeerClient {
    pub fn new(directory: Arc<dyn PeerDirectory>, reputation: Arc<ReputationTracker>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(PEER_REQUEST_TIMEOUT)
            .build()
            .expect("reqwest client with a fixed timeout always builds");
        Self { directory, reputation, client }
    }
}

#[async_trait]
impl PeerClient for HttpPeerClient {
    async fn verify_snapshot(
        &self,
        peer: &PeerId,
        created: &SnapshotCreated,
    ) -> Option<SnapshotVerification> {
        let base_url = self.directory.base_url(peer)?;
        let url = format!("{base_url}/snapshot/verify");

        let result = self.client.post(&url).json(created).send().await;
        match result {
            Ok(response) => match response.json::<SnapshotVerification>().await {
                Ok(verification) => {
                    self.reputation.record_success(peer);
                    Some(verification)
                }
                Err(err) => {
                    warn!(%peer, %err, "peer returned an unparsable snapshot verification");
                    self.reputation.record_failure(peer);
                    None
                }
            },
            Err(err) => {
                warn!(%peer, %err, "snapshot verification request failed");
                self.reputation.record_failure(peer);
                None
            }
        }
    }

    async fn recent_snapshots(&self, peer: &PeerId) -> Option<Vec<RecentSnapshot>> {
        let base_url = self.directory.base_url(peer)?;
        let url = format!("{base_url}/snapshot/recent");

        let result = self.client.get(&url).send().await;
        match result {
            Ok(response) => match response.json::<Vec<RecentSnapshot>>().await {
                Ok(snapshots) => {
                    self.reputation.record_success(peer);
                    Some(snapshots)
                }
                Err(err) => {
                    warn!(%peer, %err, "peer returned unparsable recent snapshots");
                    self.reputation.record_failure(peer);
                    None
                }
            },
            Err(err) => {
                warn!(%peer, %err, "recent snapshots request failed");
                self.reputation.record_failure(peer);
                None
            }
        }
    }
}
