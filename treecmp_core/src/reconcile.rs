use crate::hasher::HashPass;
use crate::progress::Phase;
use crate::scanner::TreeListing;
use std::collections::BTreeSet;
use std::path::Path;
use tracing::{debug, info};
use treecmp_common::{ComparisonEntry, EngineError, HashError, RelPath, Side};

/// Path-level reconciliation of two listings, before rename detection
#[derive(Debug, Clone, Default)]
pub struct PartialReport {
    pub identical: Vec<RelPath>,
    pub different: Vec<RelPath>,
    pub unreadable: Vec<ComparisonEntry>,
    pub only_files_a: BTreeSet<RelPath>,
    pub only_files_b: BTreeSet<RelPath>,
    pub only_folders_a: BTreeSet<RelPath>,
    pub only_folders_b: BTreeSet<RelPath>,
}

impl PartialReport {
    /// Number of paths present as files on both sides
    pub fn common_count(&self) -> usize {
        self.identical.len() + self.different.len() + self.unreadable.len()
    }
}

/// Split both listings into one-sided and common sets, then classify every
/// common file by content digest.
pub fn reconcile(
    pass: &HashPass<'_>,
    root_a: &Path,
    root_b: &Path,
    a: &TreeListing,
    b: &TreeListing,
) -> Result<PartialReport, EngineError> {
    let only_folders_a: BTreeSet<RelPath> = a.folders.difference(&b.folders).cloned().collect();
    let only_folders_b: BTreeSet<RelPath> = b.folders.difference(&a.folders).cloned().collect();

    let only_files_a: BTreeSet<RelPath> = a.files.difference(&b.files).cloned().collect();
    let only_files_b: BTreeSet<RelPath> = b.files.difference(&a.files).cloned().collect();
    let common: Vec<&RelPath> = a.files.intersection(&b.files).collect();

    info!(
        "Reconciled paths: {} common, {} only in A, {} only in B",
        common.len(),
        only_files_a.len(),
        only_files_b.len()
    );

    let progress = pass.progress();
    // Each common path is hashed once per side
    progress.phase_started(Phase::Comparing, 2 * common.len() as u64);
    let digests_a = pass.hash_all(Phase::Comparing, root_a, &common)?;
    let digests_b = pass.hash_all(Phase::Comparing, root_b, &common)?;
    progress.phase_finished(Phase::Comparing);

    let mut report = PartialReport {
        only_files_a,
        only_files_b,
        only_folders_a,
        only_folders_b,
        ..PartialReport::default()
    };

    for ((path, digest_a), digest_b) in common.into_iter().zip(digests_a).zip(digests_b) {
        match (digest_a, digest_b) {
            (Ok(left), Ok(right)) if left == right => report.identical.push(path.clone()),
            (Ok(_), Ok(_)) => {
                debug!("Content differs: {}", path);
                report.different.push(path.clone());
            }
            (Err(err), Ok(_)) => report.unreadable.push(unreadable(path, Side::A, &err)),
            (Ok(_), Err(err)) => report.unreadable.push(unreadable(path, Side::B, &err)),
            (Err(err_a), Err(err_b)) => report.unreadable.push(ComparisonEntry::unreadable(
                path.clone(),
                Side::Both,
                format!("{}; {}", err_a.source, err_b.source),
            )),
        }
    }

    Ok(report)
}

fn unreadable(path: &RelPath, side: Side, err: &HashError) -> ComparisonEntry {
    ComparisonEntry::unreadable(path.clone(), side, err.source.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::FileHasher;
    use crate::progress::testing::RecordingObserver;
    use std::fs;
    use tempfile::TempDir;
    use treecmp_common::Classification;

    fn listing(files: &[&str], folders: &[&str]) -> TreeListing {
        TreeListing {
            files: files.iter().map(|p| RelPath::from(*p)).collect(),
            folders: folders.iter().map(|p| RelPath::from(*p)).collect(),
            warnings: Vec::new(),
        }
    }

    fn write(root: &Path, path: &str, content: &str) {
        let full = root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }

    fn names(paths: &[RelPath]) -> Vec<&str> {
        paths.iter().map(RelPath::as_str).collect()
    }

    #[test]
    fn test_reconcile_identical_and_different() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        write(a.path(), "a.txt", "hello");
        write(a.path(), "b.txt", "world");
        write(b.path(), "a.txt", "hello");
        write(b.path(), "b.txt", "WORLD");

        let hasher = FileHasher::default();
        let pass = HashPass::new(&hasher);
        let files = listing(&["a.txt", "b.txt"], &[]);
        let report = reconcile(&pass, a.path(), b.path(), &files, &files).unwrap();

        assert_eq!(names(&report.identical), vec!["a.txt"]);
        assert_eq!(names(&report.different), vec!["b.txt"]);
        assert!(report.unreadable.is_empty());
        assert!(report.only_files_a.is_empty());
        assert!(report.only_files_b.is_empty());
        assert_eq!(report.common_count(), 2);
    }

    #[test]
    fn test_reconcile_partitions_paths() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        for name in ["shared.txt", "left.txt"] {
            write(a.path(), name, name);
        }
        for name in ["shared.txt", "right.txt"] {
            write(b.path(), name, name);
        }

        let hasher = FileHasher::default();
        let pass = HashPass::new(&hasher);
        let listing_a = listing(&["shared.txt", "left.txt"], &["docs", "common"]);
        let listing_b = listing(&["shared.txt", "right.txt"], &["common", "assets"]);
        let report = reconcile(&pass, a.path(), b.path(), &listing_a, &listing_b).unwrap();

        assert!(report.only_files_a.is_disjoint(&report.only_files_b));
        assert!(report.only_files_a.contains(&RelPath::from("left.txt")));
        assert!(report.only_files_b.contains(&RelPath::from("right.txt")));
        assert_eq!(names(&report.identical), vec!["shared.txt"]);
        assert_eq!(
            report.only_folders_a.iter().map(RelPath::as_str).collect::<Vec<_>>(),
            vec!["docs"]
        );
        assert_eq!(
            report.only_folders_b.iter().map(RelPath::as_str).collect::<Vec<_>>(),
            vec!["assets"]
        );
    }

    #[test]
    fn test_reconcile_file_and_folder_never_common() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        write(a.path(), "data", "file on A");
        fs::create_dir(b.path().join("data")).unwrap();

        let hasher = FileHasher::default();
        let pass = HashPass::new(&hasher);
        let report = reconcile(
            &pass,
            a.path(),
            b.path(),
            &listing(&["data"], &[]),
            &listing(&[], &["data"]),
        )
        .unwrap();

        assert_eq!(report.common_count(), 0);
        assert!(report.only_files_a.contains(&RelPath::from("data")));
        assert!(report.only_folders_b.contains(&RelPath::from("data")));
    }

    #[test]
    fn test_reconcile_missing_side_is_unreadable() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        write(a.path(), "vanished.txt", "content");

        let hasher = FileHasher::default();
        let pass = HashPass::new(&hasher);
        let files = listing(&["vanished.txt"], &[]);
        let report = reconcile(&pass, a.path(), b.path(), &files, &files).unwrap();

        assert!(report.identical.is_empty());
        assert_eq!(report.unreadable.len(), 1);
        assert!(matches!(
            &report.unreadable[0].classification,
            Classification::Unreadable { side: Side::B, .. }
        ));
    }

    #[test]
    fn test_reconcile_both_sides_unreadable() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();

        let hasher = FileHasher::default();
        let pass = HashPass::new(&hasher);
        let files = listing(&["ghost.txt"], &[]);
        let report = reconcile(&pass, a.path(), b.path(), &files, &files).unwrap();

        assert_eq!(report.unreadable.len(), 1);
        assert!(matches!(
            &report.unreadable[0].classification,
            Classification::Unreadable { side: Side::Both, .. }
        ));
    }

    #[test]
    fn test_reconcile_progress_total_matches_ticks() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();
        for name in ["one.txt", "two.txt"] {
            write(a.path(), name, name);
            write(b.path(), name, name);
        }

        let hasher = FileHasher::default();
        let observer = RecordingObserver::default();
        let pass = HashPass::new(&hasher).with_progress(&observer);
        let files = listing(&["one.txt", "two.txt"], &[]);
        reconcile(&pass, a.path(), b.path(), &files, &files).unwrap();

        let phases = observer.phases.lock().unwrap().clone();
        assert_eq!(phases, vec![(Phase::Comparing, 4)]);
        assert_eq!(observer.items.lock().unwrap().len() as u64, phases[0].1);
    }

    #[test]
    fn test_reconcile_empty() {
        let a = TempDir::new().unwrap();
        let b = TempDir::new().unwrap();

        let hasher = FileHasher::default();
        let pass = HashPass::new(&hasher);
        let empty = TreeListing::default();
        let report = reconcile(&pass, a.path(), b.path(), &empty, &empty).unwrap();

        assert_eq!(report.common_count(), 0);
        assert!(report.only_files_a.is_empty() && report.only_files_b.is_empty());
        assert!(report.only_folders_a.is_empty() && report.only_folders_b.is_empty());
    }
}
