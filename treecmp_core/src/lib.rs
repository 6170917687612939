pub mod comparison;
pub mod hasher;
pub mod progress;
pub mod reconcile;
pub mod rename;
pub mod scanner;

pub use comparison::ComparisonEngine;
pub use hasher::{FileHasher, HashPass};
pub use progress::{NoProgress, Phase, ProgressObserver};
pub use reconcile::{reconcile, PartialReport};
pub use rename::{detect_renames, RenameOutcome};
pub use scanner::{FolderScanner, TreeListing};
