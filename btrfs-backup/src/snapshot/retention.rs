//! Retention policy: keep the newest snapshots, delete the rest.

use super::SnapshotEntry;

/// Entries to delete from a newest-first `entries` list when keeping `keep`.
///
/// Returns the tail after the first `keep` entries, in the same order, so the
/// oldest snapshot is last. `keep == 0` selects everything.
pub fn select_for_deletion(entries: &[SnapshotEntry], keep: usize) -> &[SnapshotEntry] {
    if entries.len() <= keep {
        return &[];
    }
    &entries[keep..]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{Duration, SystemTime};

    fn entries(n: usize) -> Vec<SnapshotEntry> {
        // newest first: p-1 is the most recent
        (1..=n)
            .map(|i| SnapshotEntry {
                name: format!("p-{}", i),
                path: PathBuf::from(format!("/snapshots/p-{}", i)),
                modified: SystemTime::UNIX_EPOCH + Duration::from_secs((100 - i) as u64),
            })
            .collect()
    }

    fn names(selected: &[SnapshotEntry]) -> Vec<&str> {
        selected.iter().map(|e| e.name.as_str()).collect()
    }

    #[test]
    fn test_keeps_newest_and_deletes_oldest() {
        let all = entries(4);
        assert_eq!(names(select_for_deletion(&all, 2)), vec!["p-3", "p-4"]);
    }

    #[test]
    fn test_nothing_to_delete_within_limit() {
        let all = entries(3);
        assert!(select_for_deletion(&all, 3).is_empty());
        assert!(select_for_deletion(&all, 10).is_empty());
        assert!(select_for_deletion(&[], 0).is_empty());
    }

    #[test]
    fn test_keep_zero_deletes_everything() {
        let all = entries(3);
        assert_eq!(select_for_deletion(&all, 0), all.as_slice());
    }

    #[test]
    fn test_selection_size_and_surviving_order() {
        for n in 0..8 {
            let all = entries(n);
            for keep in 0..10 {
                let selected = select_for_deletion(&all, keep);
                assert_eq!(selected.len(), n.saturating_sub(keep));

                let survivors = &all[..n - selected.len()];
                assert_eq!(survivors, &entries(n)[..survivors.len()]);
                assert!(selected
                    .iter()
                    .all(|old| survivors.iter().all(|kept| kept.modified > old.modified)));
            }
        }
    }
}
