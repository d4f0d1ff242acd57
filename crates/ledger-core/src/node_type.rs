use serde::{Deserialize, Serialize};

/// The role a peer plays in the network, as reported by the Peer Directory.
/// C9's broadcast fanout only ever asks for peers of type `Full` (spec §4.C9,
/// §6); `Light` peers are modeled so the directory's readiness filter has
/// something to actually filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    Full,
    Light,
}
