use crate::hasher::HashPass;
use crate::progress::Phase;
use std::collections::{BTreeSet, HashMap, VecDeque};
use std::path::Path;
use tracing::{debug, info};
use treecmp_common::{ComparisonEntry, ContentDigest, EngineError, RelPath, Side};

/// Result of matching one-sided files by content
#[derive(Debug, Clone, Default)]
pub struct RenameOutcome {
    /// `(path in A, path in B)` pairs in match order
    pub renames: Vec<(RelPath, RelPath)>,
    pub remaining_a: BTreeSet<RelPath>,
    pub remaining_b: BTreeSet<RelPath>,
    /// One-sided files that could not be hashed
    pub unreadable: Vec<ComparisonEntry>,
}

/// Pair up files that exist on only one side but share a digest.
///
/// B paths are visited in ascending order and each takes the lowest-sorted
/// A path still available for its digest. With duplicate content this
/// greedy assignment may pair files differently than a human would.
pub fn detect_renames(
    pass: &HashPass<'_>,
    only_a: &BTreeSet<RelPath>,
    only_b: &BTreeSet<RelPath>,
    root_a: &Path,
    root_b: &Path,
) -> Result<RenameOutcome, EngineError> {
    let sorted_a: Vec<&RelPath> = only_a.iter().collect();
    let sorted_b: Vec<&RelPath> = only_b.iter().collect();

    let progress = pass.progress();
    progress.phase_started(
        Phase::DetectingRenames,
        (sorted_a.len() + sorted_b.len()) as u64,
    );
    let digests_a = pass.hash_all(Phase::DetectingRenames, root_a, &sorted_a)?;
    let digests_b = pass.hash_all(Phase::DetectingRenames, root_b, &sorted_b)?;
    progress.phase_finished(Phase::DetectingRenames);

    let mut outcome = RenameOutcome::default();

    // Candidate indices into `sorted_a`, kept in ascending path order
    let mut candidates: HashMap<ContentDigest, VecDeque<usize>> = HashMap::new();
    let mut readable_a = vec![false; sorted_a.len()];
    for (index, digest) in digests_a.into_iter().enumerate() {
        match digest {
            Ok(digest) => {
                candidates.entry(digest).or_default().push_back(index);
                readable_a[index] = true;
            }
            Err(err) => outcome.unreadable.push(ComparisonEntry::unreadable(
                sorted_a[index].clone(),
                Side::A,
                err.source.to_string(),
            )),
        }
    }

    let mut matched_a = vec![false; sorted_a.len()];
    for (path_b, digest) in sorted_b.into_iter().zip(digests_b) {
        let digest = match digest {
            Ok(digest) => digest,
            Err(err) => {
                outcome.unreadable.push(ComparisonEntry::unreadable(
                    path_b.clone(),
                    Side::B,
                    err.source.to_string(),
                ));
                continue;
            }
        };

        match candidates.get_mut(&digest).and_then(VecDeque::pop_front) {
            Some(index) => {
                debug!("Rename detected: {} -> {}", sorted_a[index], path_b);
                matched_a[index] = true;
                outcome.renames.push((sorted_a[index].clone(), path_b.clone()));
            }
            None => {
                outcome.remaining_b.insert(path_b.clone());
            }
        }
    }

    outcome.remaining_a = sorted_a
        .into_iter()
        .enumerate()
        .filter(|(index, _)| readable_a[*index] && !matched_a[*index])
        .map(|(_, path)| path.clone())
        .collect();

    info!(
        "Detected {} renames ({} unreadable one-sided files)",
        outcome.renames.len(),
        outcome.unreadable.len()
    );
    Ok(outcome)
}
