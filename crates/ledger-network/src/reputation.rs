use dashmap::DashMap;
use ledger_core::PeerId;

/// Rolling reputation for a single peer, derived from how its recent
/// requests have gone. Not part of the core coordination algorithm — it
/// only decides which peers `should_re_download` prefers among several
/// that hold the same wanted snapshot.
#[derive(Debug, Clone, Copy)]
pub struct PeerReputation {
    pub score: u8,
    pub successful_requests: u32,
    pub failed_requests: u32,
}

impl PeerReputation {
    fn new() -> Self {
        Self { score: 100, successful_requests: 0, failed_requests: 0 }
    }

    fn record_success(&mut self) {
        self.successful_requests += 1;
        self.score = (self.score + 1).min(100);
    }

    fn record_failure(&mut self) {
        self.failed_requests += 1;
        self.score = self.score.saturating_sub(5);
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.successful_requests + self.failed_requests;
        if total == 0 {
            1.0
        } else {
            self.successful_requests as f64 / total as f64
        }
    }
}

/// Tracks reputation per peer across the lifetime of the process.
#[derive(Default)]
pub struct ReputationTracker {
    peers: DashMap<PeerId, PeerReputation>,
}

impl ReputationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_success(&self, peer: &PeerId) {
        self.peers.entry(peer.clone()).or_insert_with(PeerReputation::new).record_success();
    }

    pub fn record_failure(&self, peer: &PeerId) {
        self.peers.entry(peer.clone()).or_insert_with(PeerReputation::new).record_failure();
    }

    pub fn score(&self, peer: &PeerId) -> u8 {
        self.peers.get(peer).map(|r| r.score).unwrap_or(100)
    }

    /// Orders `peers` by descending reputation, ties broken by id so the
    /// order is stable.
    pub fn rank(&self, mut peers: Vec<PeerId>) -> Vec<PeerId> {
        peers.sort_by(|a, b| self.score(b).cmp(&self.score(a)).then_with(|| a.cmp(b)));
        peers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_peer_starts_at_full_reputation() {
        let tracker = ReputationTracker::new();
        assert_eq!(tracker.score(&"p1".to_string()), 100);
    }

    #[test]
    fn failures_decay_reputation() {
        let tracker = ReputationTracker::new();
        tracker.record_failure(&"p1".to_string());
        assert_eq!(tracker.score(&"p1".to_string()), 95);
    }

    #[test]
    fn rank_prefers_higher_reputation() {
        let tracker = ReputationTracker::new();
        tracker.record_failure(&"bad".to_string());
        tracker.record_success(&"good".to_string());
        let ranked = tracker.rank(vec!["bad".to_string(), "good".to_string()]);
        assert_eq!(ranked, vec!["good".to_string(), "bad".to_string()]);
    }
}
