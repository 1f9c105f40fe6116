use crate::search::protocol::SnapshotEntry;

/// Signature of the function the search worker runs against each snapshot.
pub type Matcher = fn(&[SnapshotEntry], &str) -> Vec<SnapshotEntry>;

/// Case-sensitive substring match of `keyword` against each title, keeping
/// snapshot order. An empty keyword matches every entry.
pub fn match_titles(snapshot: &[SnapshotEntry], keyword: &str) -> Vec<SnapshotEntry> {
    snapshot.iter()
        .filter(|entry| entry.title.contains(keyword))
        .cloned()
        .collect()
}
