use ignore::gitignore::{Gitignore, GitignoreBuilder};
use jwalk::WalkDir;
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use treecmp_common::{AppConfig, EngineError, PathError, RelPath, Side, TraversalWarning};

/// Files and folders found below one root
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeListing {
    pub files: BTreeSet<RelPath>,
    pub folders: BTreeSet<RelPath>,
    pub warnings: Vec<TraversalWarning>,
}

impl TreeListing {
    /// Record a subtree that could not be listed
    fn skip_subtree(&mut self, side: Side, path: String, message: String) {
        warn!("Skipping unreadable subtree '{}' on side {}: {}", path, side, message);
        self.warnings.push(TraversalWarning { side, path, message });
    }
}

/// Recursive tree enumerator using jwalk
pub struct FolderScanner {
    follow_symlinks: bool,
    custom_ignore: Option<Gitignore>,
}

impl FolderScanner {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            follow_symlinks: config.follow_symlinks,
            custom_ignore: Self::build_custom_ignore(config),
        }
    }

    /// Build a Gitignore from custom ignore patterns in config
    fn build_custom_ignore(config: &AppConfig) -> Option<Gitignore> {
        if config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new("");
        for pattern in &config.ignore_patterns {
            if let Err(err) = builder.add_line(None, pattern) {
                warn!("Failed to add ignore pattern '{}': {}", pattern, err);
            } else {
                debug!("Added ignore pattern: {}", pattern);
            }
        }

        match builder.build() {
            Ok(ignore) => Some(ignore),
            Err(e) => {
                warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }

    /// Enumerate every file and folder below `root`
    pub fn scan(&self, root: &Path, side: Side) -> Result<TreeListing, EngineError> {
        self.scan_with_cancel(root, side, None)
    }

    /// Enumerate with cancellation checked between entries.
    ///
    /// A missing or unlistable root is fatal. Subdirectories that cannot be
    /// read are skipped and recorded as warnings.
    pub fn scan_with_cancel(
        &self,
        root: &Path,
        side: Side,
        cancel: Option<&AtomicBool>,
    ) -> Result<TreeListing, EngineError> {
        check_root(root)?;

        let mut listing = TreeListing::default();

        let walker = WalkDir::new(root)
            .follow_links(self.follow_symlinks)
            .skip_hidden(false);

        for entry in walker {
            if cancel.map_or(false, |flag| flag.load(Ordering::Relaxed)) {
                return Err(EngineError::Cancelled);
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let location = e
                        .path()
                        .and_then(|path| path.strip_prefix(root).ok())
                        .and_then(RelPath::from_relative)
                        .map(|path| path.to_string())
                        .unwrap_or_default();
                    listing.skip_subtree(side, location, e.to_string());
                    continue;
                }
            };

            let path = entry.path();
            let Some(relative) = path
                .strip_prefix(root)
                .ok()
                .and_then(RelPath::from_relative)
            else {
                // Synthetic root entry
                continue;
            };

            let is_dir = if entry.file_type().is_symlink() {
                // Not followed: classify by target without descending
                fs::metadata(&path).map(|m| m.is_dir()).unwrap_or(false)
            } else {
                entry.file_type().is_dir()
            };

            if self.should_ignore_with_parents(&path, root, is_dir) {
                continue;
            }

            if is_dir {
                // Listed but not descended into
                if let Some(err) = entry.read_children_error.as_ref() {
                    listing.skip_subtree(side, relative.to_string(), err.to_string());
                }
                listing.folders.insert(relative);
            } else {
                listing.files.insert(relative);
            }
        }

        debug!(
            "Scanned {} files and {} folders from {:?}",
            listing.files.len(),
            listing.folders.len(),
            root
        );
        Ok(listing)
    }

    /// Check if a path or any of its parent directories should be ignored
    fn should_ignore_with_parents(&self, path: &Path, root: &Path, is_dir: bool) -> bool {
        let Some(ref custom_ignore) = self.custom_ignore else {
            return false;
        };
        let Ok(relative) = path.strip_prefix(root) else {
            return false;
        };

        if custom_ignore.matched(relative, is_dir).is_ignore() {
            return true;
        }

        let mut current = relative;
        while let Some(parent) = current.parent() {
            if !parent.as_os_str().is_empty() && custom_ignore.matched(parent, true).is_ignore() {
                return true;
            }
            current = parent;
        }
        false
    }
}

fn check_root(root: &Path) -> Result<(), PathError> {
    let metadata = fs::metadata(root).map_err(|e| PathError::from_io(root.to_path_buf(), e))?;
    if !metadata.is_dir() {
        return Err(PathError::NotADirectory(root.to_path_buf()));
    }
    fs::read_dir(root).map_err(|source| PathError::Unreadable {
        path: root.to_path_buf(),
        source,
    })?;
    Ok(())
}
