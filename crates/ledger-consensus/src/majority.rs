use std::collections::HashMap;

use ledger_core::{Hash, Occurrences, PeerProposal, SnapshotsAtHeight};

/// Groups proposals by height and tallies occurrences of each proposed hash
/// at that height, sorted ascending by hash for deterministic tie-breaking
/// downstream. `own` counts as one more proposer alongside `peers` —
/// `peersSize = |peers| + 1` (spec §4.C6).
pub fn tally_occurrences(
    own: &SnapshotsAtHeight,
    peers: &[PeerProposal],
) -> HashMap<i64, Vec<Occurrences<Hash>>> {
    let peers_size = peers.len() + 1;
    let mut counts_by_height: HashMap<i64, HashMap<Hash, usize>> = HashMap::new();
    for (&height, hash) in own {
        *counts_by_height.entry(height).or_default().entry(hash.clone()).or_insert(0) += 1;
    }
    for proposal in peers {
        for (&height, hash) in &proposal.snapshots {
            *counts_by_height.entry(height).or_default().entry(hash.clone()).or_insert(0) += 1;
        }
    }

    counts_by_height
        .into_iter()
        .map(|(height, counts)| {
            let mut occurrences: Vec<Occurrences<Hash>> = counts
                .into_iter()
                .map(|(value, n)| Occurrences { value, n, of: peers_size })
                .collect();
            occurrences.sort_by(|a, b| a.value.cmp(&b.value));
            (height, occurrences)
        })
        .collect()
}

/// Chooses the cluster's majority state, height by height (C6).
///
/// A height is included in the result only when the chooser can commit to
/// one answer: either a clear majority (at least half of all proposers,
/// self included, agree), or every proposer has weighed in and a
/// deterministic tie-break is safe. If neither holds, the height is left
/// out rather than guessed — the caller sees an absent entry as "still
/// waiting on peers", not as agreement on nothing.
pub fn choose_majority_state(own: &SnapshotsAtHeight, peers: &[PeerProposal]) -> SnapshotsAtHeight {
    let peers_size = peers.len() + 1;
    let mut result = SnapshotsAtHeight::new();
    for (height, occurrences) in tally_occurrences(own, peers) {
        if let Some(hash) = choose_for_height(&occurrences, peers_size) {
            result.insert(height, hash);
        }
    }
    result
}

fn choose_for_height(occurrences: &[Occurrences<Hash>], peers_size: usize) -> Option<Hash> {
    if occurrences.is_empty() || peers_size == 0 {
        return None;
    }

    if let Some(clear_majority) = occurrences.iter().find(|o| o.n * 2 >= peers_size) {
        return Some(clear_majority.value.clone());
    }

    let responded: usize = occurrences.iter().map(|o| o.n).sum();
    if responded < peers_size {
        // Not every proposer has an opinion on this height yet; withhold
        // judgment instead of committing on partial information.
        return None;
    }

    // Every proposer weighed in, nobody reached half: break the tie by vote
    // count first, then by the lexicographically smallest hash so the
    // result is stable across calls with the same input.
    let mut ranked = occurrences.to_vec();
    ranked.sort_by(|a, b| b.n.cmp(&a.n).then_with(|| a.value.cmp(&b.value)));
    ranked.first().map(|o| o.value.clone())
}
