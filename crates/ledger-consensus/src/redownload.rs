use std::cmp::Reverse;
use std::collections::BTreeMap;

use ledger_core::{PeerId, PeerSnapshotList, ProcessingConfig, RecentSnapshot, SnapshotDiff};

/// Groups peers by their *entire* recent-snapshot list and returns the
/// largest group's list plus its peer set (C7's own `chooseMajorityState` —
/// distinct from C6's height-by-height chooser of the same spec name, which
/// tallies per height instead of grouping whole lists). Ties are broken
/// deterministically by preferring the lexicographically smallest list.
pub fn choose_majority_snapshot_list(cluster: &[PeerSnapshotList]) -> (Vec<RecentSnapshot>, Vec<PeerId>) {
    let mut groups: BTreeMap<Vec<RecentSnapshot>, Vec<PeerId>> = BTreeMap::new();
    for entry in cluster {
        groups.entry(entry.snapshots.clone()).or_default().push(entry.peer_id.clone());
    }

    groups
        .into_iter()
        .min_by_key(|(key, peers)| (Reverse(peers.len()), key.clone()))
        .unwrap_or_default()
}

fn diff_against(own: &[RecentSnapshot], majority: &[RecentSnapshot], peers: Vec<PeerId>) -> SnapshotDiff {
    let to_delete: Vec<RecentSnapshot> = own.iter().filter(|s| !majority.contains(s)).cloned().collect();
    let mut to_download: Vec<RecentSnapshot> = majority.iter().filter(|s| !own.contains(s)).cloned().collect();
    to_download.reverse();
    SnapshotDiff { to_delete, to_download, peers }
}

/// Computes what a node would need to delete and download to align its
/// recent snapshots with the cluster majority (C7).
///
/// `toDelete = own \ majority` (set difference, preserving own order);
/// `toDownload = reverse(majority \ own)`, reversed so the lowest-height
/// download runs first.
pub fn compare_snapshot_state(own: &[RecentSnapshot], cluster: &[PeerSnapshotList]) -> SnapshotDiff {
    let (majority, peers) = choose_majority_snapshot_list(cluster);
    diff_against(own, &majority, peers)
}

/// Same as [`compare_snapshot_state`], but also returns the chosen majority
/// list — callers that drive a redownload (C9's `broadcastSnapshot` and
/// `verifyRecentSnapshots`) need it afterward to overwrite `recentSnapshots`.
pub fn compare_snapshot_state_with_majority(
    own: &[RecentSnapshot],
    cluster: &[PeerSnapshotList],
) -> (SnapshotDiff, Vec<RecentSnapshot>) {
    let (majority, peers) = choose_majority_snapshot_list(cluster);
    let diff = diff_against(own, &majority, peers);
    (diff, majority)
}

/// Whether a node has fallen far enough, or diverged badly enough, from the
/// cluster majority to warrant a redownload episode (C7/C8).
pub fn should_re_download(own: &[RecentSnapshot], diff: &SnapshotDiff, config: &ProcessingConfig) -> bool {
    if diff.to_delete.is_empty() || diff.to_download.is_empty() || diff.peers.is_empty() {
        return false;
    }
    below_interval(own, diff, config) || is_misaligned(own, diff)
}

fn below_interval(own: &[RecentSnapshot], diff: &SnapshotDiff, config: &ProcessingConfig) -> bool {
    let download_max = match diff.to_download.iter().map(|s| s.height).max() {
        Some(max) => max,
        None => return false,
    };
    match own.iter().map(|s| s.height).max() {
        Some(own_max) => own_max + config.snapshot_height_redownload_delay_interval < download_max,
        None => true,
    }
}

fn is_misaligned(own: &[RecentSnapshot], diff: &SnapshotDiff) -> bool {
    own.iter().any(|snapshot| {
        diff.to_delete
            .iter()
            .chain(diff.to_download.iter())
            .any(|entry| entry.height == snapshot.height && entry.hash != snapshot.hash)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster(entries: &[(&str, &[(i64, &str)])]) -> Vec<PeerSnapshotList> {
        entries
            .iter()
            .map(|&(peer, snapshots)| PeerSnapshotList {
                peer_id: peer.to_string(),
                snapshots: snapshots.iter().map(|&(h, hash)| RecentSnapshot::new(hash, h)).collect(),
            })
            .collect()
    }

    #[test]
    fn diff_is_empty_when_aligned() {
        let own = vec![RecentSnapshot::new("a", 10)];
        let diff = compare_snapshot_state(&own, &cluster(&[("p1", &[(10, "a")])]));
        assert!(diff.to_delete.is_empty());
        assert!(diff.to_download.is_empty());
    }

    #[test]
    fn largest_group_wins_the_majority() {
        let own: Vec<RecentSnapshot> = vec![];
        let diff = compare_snapshot_state(
            &own,
            &cluster(&[("p1", &[(10, "a")]), ("p2", &[(10, "a")]), ("p3", &[(10, "b")])]),
        );
        assert_eq!(diff.to_download, vec![RecentSnapshot::new("a", 10)]);
        assert_eq!(diff.peers, vec!["p1".to_string(), "p2".to_string()]);
    }

    #[test]
    fn ties_break_toward_the_lexicographically_smallest_list() {
        let (majority, peers) =
            choose_majority_snapshot_list(&cluster(&[("p1", &[(1, "b")]), ("p2", &[(1, "a")])]));
        assert_eq!(majority, vec![RecentSnapshot::new("a", 1)]);
        assert_eq!(peers, vec!["p2".to_string()]);
    }

    /// S4 (spec §8): own is ahead at height 3 but diverges; majority also
    /// has an older height the node never saw. Downloads come back in
    /// ascending height order.
    #[test]
    fn scenario_s4_diff_reversal() {
        let own = vec![RecentSnapshot::new("X", 3), RecentSnapshot::new("Y", 2)];
        let majority_list =
            vec![RecentSnapshot::new("Z", 3), RecentSnapshot::new("Y", 2), RecentSnapshot::new("W", 1)];
        let diff = diff_against(&own, &majority_list, vec!["p1".to_string()]);
        assert_eq!(diff.to_delete, vec![RecentSnapshot::new("X", 3)]);
        assert_eq!(diff.to_download, vec![RecentSnapshot::new("W", 1), RecentSnapshot::new("Z", 3)]);
    }

    #[test]
    fn should_re_download_when_far_below_interval() {
        let own = vec![RecentSnapshot::new("a", 1)];
        let diff = compare_snapshot_state(&own, &cluster(&[("p1", &[(50, "z")])]));
        let config = ProcessingConfig::default();
        assert!(should_re_download(&own, &diff, &config));
    }

    #[test]
    fn should_not_re_download_within_interval() {
        let own = vec![RecentSnapshot::new("a", 45)];
        let diff = compare_snapshot_state(&own, &cluster(&[("p1", &[(50, "z")])]));
        let config = ProcessingConfig::default();
        assert!(!should_re_download(&own, &diff, &config));
    }

    /// S5 (spec §8): own forks from the majority at the same height —
    /// misaligned, regardless of how close the heights are.
    #[test]
    fn scenario_s5_misalignment_triggers_redownload() {
        let own = vec![RecentSnapshot::new("A", 5)];
        let diff = compare_snapshot_state(&own, &cluster(&[("p1", &[(5, "B")])]));
        assert_eq!(diff.to_delete, vec![RecentSnapshot::new("A", 5)]);
        assert_eq!(diff.to_download, vec![RecentSnapshot::new("B", 5)]);
        let config = ProcessingConfig::default();
        assert!(should_re_download(&own, &diff, &config));
    }

    #[test]
    fn no_own_snapshots_but_cluster_has_history_forces_redownload() {
        let own: Vec<RecentSnapshot> = vec![];
        let diff = compare_snapshot_state(&own, &cluster(&[("p1", &[(1, "a")])]));
        let config = ProcessingConfig::default();
        assert!(should_re_download(&own, &diff, &config));
    }

    /// Invariant 5 (spec §8): when every peer agrees with self, the diff is
    /// empty and no redownload is warranted.
    #[test]
    fn invariant_cluster_matching_own_yields_no_redownload() {
        let own = vec![RecentSnapshot::new("a", 1), RecentSnapshot::new("b", 2)];
        let diff = compare_snapshot_state(
            &own,
            &cluster(&[("p1", &[(1, "a"), (2, "b")]), ("p2", &[(1, "a"), (2, "b")])]),
        );
        assert!(diff.to_delete.is_empty() && diff.to_download.is_empty());
        let config = ProcessingConfig::default();
        assert!(!should_re_download(&own, &diff, &config));
    }

    #[test]
    fn empty_cluster_yields_empty_diff_and_no_redownload() {
        let own = vec![RecentSnapshot::new("a", 1)];
        let diff = compare_snapshot_state(&own, &[]);
        assert!(diff.peers.is_empty());
        let config = ProcessingConfig::default();
        assert!(!should_re_download(&own, &diff, &config));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        fn snapshot_list() -> impl Strategy<Value = Vec<RecentSnapshot>> {
            prop_oneof![
                Just(vec![RecentSnapshot::new("a", 1)]),
                Just(vec![RecentSnapshot::new("b", 1)]),
                Just(vec![RecentSnapshot::new("a", 1), RecentSnapshot::new("c", 2)]),
            ]
        }

        fn cluster_entries() -> impl Strategy<Value = Vec<PeerSnapshotList>> {
            prop::collection::vec(snapshot_list(), 0..6).prop_map(|lists| {
                lists
                    .into_iter()
                    .enumerate()
                    .map(|(i, snapshots)| PeerSnapshotList { peer_id: format!("peer{i}"), snapshots })
                    .collect()
            })
        }

        proptest! {
            // C7's chooser is deterministic and independent of the order
            // peers appear in the cluster — shuffling never changes which
            // list wins or which peers are credited with it.
            #[test]
            fn tie_break_is_independent_of_cluster_order(cluster in cluster_entries()) {
                let forward = choose_majority_snapshot_list(&cluster);
                let mut reversed = cluster.clone();
                reversed.reverse();
                let backward = choose_majority_snapshot_list(&reversed);
                prop_assert_eq!(forward.0, backward.0);
                let mut forward_peers = forward.1;
                let mut backward_peers = backward.1;
                forward_peers.sort();
                backward_peers.sort();
                prop_assert_eq!(forward_peers, backward_peers);
            }

            // I5: a diff is only ever "worth acting on" (should_re_download)
            // when it is non-empty on both sides and has a peer to serve it.
            #[test]
            fn should_re_download_implies_nonempty_diff(cluster in cluster_entries(), own in snapshot_list()) {
                let diff = compare_snapshot_state(&own, &cluster);
                let config = ProcessingConfig::default();
                if should_re_download(&own, &diff, &config) {
                    prop_assert!(!diff.to_delete.is_empty());
                    prop_assert!(!diff.to_download.is_empty());
                    prop_assert!(!diff.peers.is_empty());
                }
            }
        }
    }
}
