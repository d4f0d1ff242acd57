use ledger_core::ConsensusStatus;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum StoreError {
    /// `InConsensus` is not reachable via `put`/`put_with_status` — the only
    /// way into InConsensus is `pull_for_consensus` (spec §4.C4).
    #[error("status {0} is not reachable via put")]
    UnreachableViaPut(ConsensusStatus),
}
