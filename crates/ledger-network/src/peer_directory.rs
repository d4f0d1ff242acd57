use async_trait::async_trait;
use ledger_core::{NodeType, PeerId};

/// The set of known peers and how to reach them. This is an external
/// collaborator — membership, discovery and address resolution are owned by
/// the peer-to-peer networking layer, not by the coordination code here.
/// Everything in this crate only consumes peers through this trait.
#[async_trait]
pub trait PeerDirectory: Send + Sync {
    /// Peers currently reachable and of the given type (spec §6
    /// `readyPeers(nodeType)`). C9's broadcast fanout only ever asks for
    /// `NodeType::Full`.
    async fn ready_peers(&self, node_type: NodeType) -> Vec<PeerId>;

    /// The HTTP base URL to reach `peer` at, if still known.
    fn base_url(&self, peer: &PeerId) -> Option<String>;
}

/// A fixed, in-memory directory — useful for tests and for small static
/// deployments where peers are configured rather than discovered. Every
/// entry is assumed ready; `new` defaults every peer to `NodeType::Full`,
/// the only type this workspace's loops actually ask for.
pub struct StaticPeerDirectory {
    peers: Vec<(PeerId, String, NodeType)>,
}

impl StaticPeerDirectory {
    pub fn new(peers: Vec<(PeerId, String)>) -> Self {
        Self { peers: peers.into_iter().map(|(id, url)| (id, url, NodeType::Full)).collect() }
    }

    pub fn with_types(peers: Vec<(PeerId, String, NodeType)>) -> Self {
        Self { peers }
    }
}

#[async_trait]
impl PeerDirectory for StaticPeerDirectory {
    async fn ready_peers(&self, node_type: NodeType) -> Vec<PeerId> {
        self.peers.iter().filter(|(_, _, t)| *t == node_type).map(|(id, _, _)| id.clone()).collect()
    }

    fn base_url(&self, peer: &PeerId) -> Option<String> {
        self.peers.iter().find(|(id, _, _)| id == peer).map(|(_, url, _)| url.clone())
    }
}
