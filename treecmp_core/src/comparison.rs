use crate::hasher::{FileHasher, HashPass};
use crate::progress::{NoProgress, Phase, ProgressObserver};
use crate::reconcile::reconcile;
use crate::rename::detect_renames;
use crate::scanner::FolderScanner;
use chrono::Utc;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use tracing::info;
use treecmp_common::{
    AppConfig, Classification, ComparisonEntry, ComparisonReport, EngineError, EntryKind, RelPath,
    ReportParts, Side,
};

/// Compares two directory trees by path and content
pub struct ComparisonEngine {
    scanner: FolderScanner,
    hasher: FileHasher,
    threads: usize,
}

impl ComparisonEngine {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            scanner: FolderScanner::new(config),
            hasher: FileHasher::new(config.algorithm),
            threads: config.threads,
        }
    }

    /// Compare `root_a` against `root_b`
    pub fn compare(&self, root_a: &Path, root_b: &Path) -> Result<ComparisonReport, EngineError> {
        self.compare_with_progress(root_a, root_b, &NoProgress, None)
    }

    /// Compare with progress notifications and an optional cancel flag. A
    /// cancelled run returns `EngineError::Cancelled`, never a partial report.
    pub fn compare_with_progress(
        &self,
        root_a: &Path,
        root_b: &Path,
        progress: &dyn ProgressObserver,
        cancel: Option<&AtomicBool>,
    ) -> Result<ComparisonReport, EngineError> {
        let started_at = Utc::now();
        info!("Comparing {:?} with {:?}", root_a, root_b);

        progress.phase_started(Phase::Scanning(Side::A), 0);
        let listing_a = self.scanner.scan_with_cancel(root_a, Side::A, cancel)?;
        progress.phase_finished(Phase::Scanning(Side::A));

        progress.phase_started(Phase::Scanning(Side::B), 0);
        let listing_b = self.scanner.scan_with_cancel(root_b, Side::B, cancel)?;
        progress.phase_finished(Phase::Scanning(Side::B));

        info!(
            "Found {} files / {} folders in A, {} files / {} folders in B",
            listing_a.files.len(),
            listing_a.folders.len(),
            listing_b.files.len(),
            listing_b.folders.len()
        );

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.threads)
            .build()
            .map_err(|e| EngineError::Config(format!("Failed to start hashing pool: {}", e)))?;

        let pass = HashPass::new(&self.hasher)
            .with_cancel(cancel)
            .with_progress(progress);

        let (partial, renames) = pool.install(|| {
            let partial = reconcile(&pass, root_a, root_b, &listing_a, &listing_b)?;
            let renames = detect_renames(
                &pass,
                &partial.only_files_a,
                &partial.only_files_b,
                root_a,
                root_b,
            )?;
            Ok::<_, EngineError>((partial, renames))
        })?;

        let total_compared = partial.common_count();
        let mut entries = Vec::with_capacity(
            total_compared
                + renames.renames.len()
                + renames.unreadable.len()
                + renames.remaining_a.len()
                + renames.remaining_b.len()
                + partial.only_folders_a.len()
                + partial.only_folders_b.len(),
        );

        entries.extend(
            partial
                .identical
                .into_iter()
                .map(|path| ComparisonEntry::new(path, Classification::IdenticalFile)),
        );
        entries.extend(
            partial
                .different
                .into_iter()
                .map(|path| ComparisonEntry::new(path, Classification::DifferentFile)),
        );
        entries.extend(
            renames
                .renames
                .into_iter()
                .map(|(from, to)| ComparisonEntry::new(from, Classification::Renamed { to })),
        );

        let mut unreadable = partial.unreadable;
        unreadable.extend(renames.unreadable);
        unreadable.sort_by(|a, b| a.path.cmp(&b.path));
        entries.extend(unreadable);

        entries.extend(one_sided(renames.remaining_a, partial.only_folders_a, Side::A));
        entries.extend(one_sided(renames.remaining_b, partial.only_folders_b, Side::B));

        let mut warnings = listing_a.warnings;
        warnings.extend(listing_b.warnings);

        let report = ComparisonReport::new(ReportParts {
            root_a: root_a.to_path_buf(),
            root_b: root_b.to_path_buf(),
            algorithm: self.hasher.algorithm(),
            started_at,
            total_compared,
            entries,
            warnings,
        });

        let summary = report.summary();
        info!(
            "Comparison finished: {} identical, {} different, {} renamed, {} unreadable, {} only in A, {} only in B",
            summary.identical,
            summary.different,
            summary.renamed,
            summary.unreadable,
            summary.only_in_a,
            summary.only_in_b
        );
        Ok(report)
    }
}

/// Files first, then folders, each in path order
fn one_sided(
    files: impl IntoIterator<Item = RelPath>,
    folders: impl IntoIterator<Item = RelPath>,
    side: Side,
) -> Vec<ComparisonEntry> {
    let tag = |kind: EntryKind| match side {
        Side::B => Classification::OnlyInB { kind },
        _ => Classification::OnlyInA { kind },
    };

    files
        .into_iter()
        .map(|path| ComparisonEntry::new(path, tag(EntryKind::File)))
        .chain(
            folders
                .into_iter()
                .map(|path| ComparisonEntry::new(path, tag(EntryKind::Folder))),
        )
        .collect()
}
