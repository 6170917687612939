use crate::progress::{NoProgress, Phase, ProgressObserver};
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};
use treecmp_common::{ContentDigest, EngineError, HashAlgorithm, HashError, RelPath};

/// Read block size for streaming digests
pub const CHUNK_SIZE: usize = 64 * 1024;

static NO_PROGRESS: NoProgress = NoProgress;

enum Accumulator {
    Blake3(Box<blake3::Hasher>),
    Sha256(Sha256),
}

impl Accumulator {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Blake3 => Accumulator::Blake3(Box::new(blake3::Hasher::new())),
            HashAlgorithm::Sha256 => Accumulator::Sha256(Sha256::new()),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            Accumulator::Blake3(hasher) => {
                hasher.update(data);
            }
            Accumulator::Sha256(hasher) => Digest::update(hasher, data),
        }
    }

    fn finalize(self) -> ContentDigest {
        match self {
            Accumulator::Blake3(hasher) => hasher.finalize().into(),
            Accumulator::Sha256(hasher) => {
                let mut bytes = [0u8; 32];
                bytes.copy_from_slice(&hasher.finalize());
                ContentDigest(bytes)
            }
        }
    }
}

/// Streams file contents into a 256-bit digest
#[derive(Debug, Clone, Copy, Default)]
pub struct FileHasher {
    algorithm: HashAlgorithm,
}

impl FileHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Compute the digest of a file. The handle is dropped on every return path.
    pub fn hash_file(&self, path: &Path) -> Result<ContentDigest, HashError> {
        let to_error = |source| HashError {
            path: path.to_path_buf(),
            source,
        };

        let file = File::open(path).map_err(to_error)?;
        self.hash_reader(file).map_err(to_error)
    }

    pub fn hash_reader<R: Read>(&self, mut reader: R) -> std::io::Result<ContentDigest> {
        let mut accumulator = Accumulator::new(self.algorithm);
        let mut buffer = vec![0; CHUNK_SIZE];

        loop {
            let n = match reader.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            accumulator.update(&buffer[..n]);
        }

        Ok(accumulator.finalize())
    }
}

/// One batch of hashing work, sharing a cancel flag and progress observer.
///
/// Files are hashed on the current rayon pool; results come back in input
/// order so callers see the same output as a sequential run.
pub struct HashPass<'a> {
    hasher: &'a FileHasher,
    cancel: Option<&'a AtomicBool>,
    progress: &'a dyn ProgressObserver,
}

impl<'a> HashPass<'a> {
    pub fn new(hasher: &'a FileHasher) -> Self {
        Self {
            hasher,
            cancel: None,
            progress: &NO_PROGRESS,
        }
    }

    pub fn with_cancel(mut self, cancel: Option<&'a AtomicBool>) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn with_progress(mut self, progress: &'a dyn ProgressObserver) -> Self {
        self.progress = progress;
        self
    }

    pub fn progress(&self) -> &'a dyn ProgressObserver {
        self.progress
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.map_or(false, |flag| flag.load(Ordering::Relaxed))
    }

    pub fn check_cancelled(&self) -> Result<(), EngineError> {
        if self.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }

    /// Hash `paths` below `root`. Per-file failures are returned in their slot;
    /// only cancellation fails the whole batch.
    pub fn hash_all(
        &self,
        phase: Phase,
        root: &Path,
        paths: &[&RelPath],
    ) -> Result<Vec<Result<ContentDigest, HashError>>, EngineError> {
        let slots: Vec<Option<Result<ContentDigest, HashError>>> = paths
            .par_iter()
            .map(|path| {
                if self.is_cancelled() {
                    return None;
                }

                let result = self.hasher.hash_file(&path.to_native(root));
                match &result {
                    Ok(digest) => debug!("{} {}", digest.to_hex(), path),
                    Err(e) => warn!("{}", e),
                }
                self.progress.item_finished(phase, path);
                Some(result)
            })
            .collect();

        self.check_cancelled()?;
        slots
            .into_iter()
            .map(|slot| slot.ok_or(EngineError::Cancelled))
            .collect()
    }
}
