use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::{Component, Path, PathBuf};
use std::str::FromStr;
use uuid::Uuid;

/// Slash-separated path relative to a comparison root.
///
/// Paths from two different trees compare equal when they name the same
/// location below their respective roots, regardless of the platform
/// separator. The native form is kept alongside the text so names that are
/// not valid UTF-8 stay distinct and resolvable; the text is lossy for those.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RelPath {
    text: String,
    native: PathBuf,
}

impl RelPath {
    /// Build from a path already stripped of its root. Returns `None` for the
    /// root itself (an empty path).
    pub fn from_relative(path: &Path) -> Option<Self> {
        let mut native = PathBuf::new();
        let mut parts = Vec::new();
        for component in path.components() {
            if let Component::Normal(part) = component {
                native.push(part);
                parts.push(part.to_string_lossy());
            }
        }

        if parts.is_empty() {
            None
        } else {
            Some(Self {
                text: parts.join("/"),
                native,
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn as_path(&self) -> &Path {
        &self.native
    }

    /// Resolve against a root using the platform separator
    pub fn to_native(&self, root: &Path) -> PathBuf {
        root.join(&self.native)
    }
}

impl From<&str> for RelPath {
    fn from(value: &str) -> Self {
        let parts: Vec<&str> = value.split('/').filter(|part| !part.is_empty()).collect();
        Self {
            text: parts.join("/"),
            native: parts.iter().collect(),
        }
    }
}

impl fmt::Display for RelPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl Serialize for RelPath {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.text)
    }
}

impl<'de> Deserialize<'de> for RelPath {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Ok(Self::from(text.as_str()))
    }
}

/// 256-bit content digest of a file's full byte stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentDigest(pub [u8; 32]);

impl ContentDigest {
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl From<blake3::Hash> for ContentDigest {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

/// Digest algorithm used for content equality
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    #[default]
    Blake3,
    Sha256,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashAlgorithm::Blake3 => f.write_str("blake3"),
            HashAlgorithm::Sha256 => f.write_str("sha256"),
        }
    }
}

impl FromStr for HashAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blake3" => Ok(HashAlgorithm::Blake3),
            "sha256" | "sha-256" => Ok(HashAlgorithm::Sha256),
            other => Err(format!("unknown hash algorithm: {other}")),
        }
    }
}

/// Which tree a path belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    A,
    B,
    /// Both copies of a common path failed
    Both,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::A => f.write_str("A"),
            Side::B => f.write_str("B"),
            Side::Both => f.write_str("A+B"),
        }
    }
}

/// Files and folders live in separate namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
}

/// Outcome for a single path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Classification {
    /// Present on both sides with equal digests
    IdenticalFile,
    /// Present on both sides with different digests
    DifferentFile,
    OnlyInA { kind: EntryKind },
    OnlyInB { kind: EntryKind },
    /// Entry path is the A-side name; `to` is where the content lives in B
    Renamed { to: RelPath },
    Unreadable { side: Side, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonEntry {
    pub path: RelPath,
    #[serde(flatten)]
    pub classification: Classification,
}

impl ComparisonEntry {
    pub fn new(path: RelPath, classification: Classification) -> Self {
        Self { path, classification }
    }

    pub fn unreadable(path: RelPath, side: Side, reason: impl Into<String>) -> Self {
        Self::new(
            path,
            Classification::Unreadable {
                side,
                reason: reason.into(),
            },
        )
    }
}

/// A subtree the enumerator had to skip
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraversalWarning {
    pub side: Side,
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    /// Paths present as files on both sides
    pub total_compared: usize,
    pub identical: usize,
    pub different: usize,
    pub renamed: usize,
    pub unreadable: usize,
    pub only_in_a: usize,
    pub only_in_b: usize,
    pub only_in_a_files: usize,
    pub only_in_a_folders: usize,
    pub only_in_b_files: usize,
    pub only_in_b_folders: usize,
}

impl ComparisonSummary {
    fn tally(entries: &[ComparisonEntry], total_compared: usize) -> Self {
        let mut summary = Self {
            total_compared,
            ..Self::default()
        };

        for entry in entries {
            match &entry.classification {
                Classification::IdenticalFile => summary.identical += 1,
                Classification::DifferentFile => summary.different += 1,
                Classification::Renamed { .. } => summary.renamed += 1,
                Classification::Unreadable { .. } => summary.unreadable += 1,
                Classification::OnlyInA { kind } => {
                    summary.only_in_a += 1;
                    match kind {
                        EntryKind::File => summary.only_in_a_files += 1,
                        EntryKind::Folder => summary.only_in_a_folders += 1,
                    }
                }
                Classification::OnlyInB { kind } => {
                    summary.only_in_b += 1;
                    match kind {
                        EntryKind::File => summary.only_in_b_files += 1,
                        EntryKind::Folder => summary.only_in_b_folders += 1,
                    }
                }
            }
        }

        summary
    }
}

/// Result of comparing two trees. Built once by the engine and handed to the
/// caller; there are no mutating accessors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparisonReport {
    run_id: Uuid,
    root_a: PathBuf,
    root_b: PathBuf,
    algorithm: HashAlgorithm,
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    summary: ComparisonSummary,
    entries: Vec<ComparisonEntry>,
    warnings: Vec<TraversalWarning>,
}

/// Everything the engine collected, before summary counts are derived
#[derive(Debug, Clone)]
pub struct ReportParts {
    pub root_a: PathBuf,
    pub root_b: PathBuf,
    pub algorithm: HashAlgorithm,
    pub started_at: DateTime<Utc>,
    pub total_compared: usize,
    pub entries: Vec<ComparisonEntry>,
    pub warnings: Vec<TraversalWarning>,
}

impl ComparisonReport {
    pub fn new(parts: ReportParts) -> Self {
        let summary = ComparisonSummary::tally(&parts.entries, parts.total_compared);
        Self {
            run_id: Uuid::new_v4(),
            root_a: parts.root_a,
            root_b: parts.root_b,
            algorithm: parts.algorithm,
            started_at: parts.started_at,
            finished_at: Utc::now(),
            summary,
            entries: parts.entries,
            warnings: parts.warnings,
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn root_a(&self) -> &Path {
        &self.root_a
    }

    pub fn root_b(&self) -> &Path {
        &self.root_b
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn finished_at(&self) -> DateTime<Utc> {
        self.finished_at
    }

    pub fn summary(&self) -> &ComparisonSummary {
        &self.summary
    }

    pub fn entries(&self) -> &[ComparisonEntry] {
        &self.entries
    }

    pub fn warnings(&self) -> &[TraversalWarning] {
        &self.warnings
    }

    /// Look up the entry recorded for `path` and `kind`
    pub fn find(&self, path: &str, kind: EntryKind) -> Option<&ComparisonEntry> {
        self.entries.iter().find(|entry| {
            entry.path.as_str() == path && entry_kind(&entry.classification) == kind
        })
    }

    /// Matched rename pairs in detection order
    pub fn renames(&self) -> impl Iterator<Item = (&RelPath, &RelPath)> {
        self.entries.iter().filter_map(|entry| match &entry.classification {
            Classification::Renamed { to } => Some((&entry.path, to)),
            _ => None,
        })
    }

    /// True when every path on both sides matched by path and content
    pub fn trees_match(&self) -> bool {
        let s = &self.summary;
        s.different == 0 && s.renamed == 0 && s.unreadable == 0 && s.only_in_a == 0 && s.only_in_b == 0
    }
}

fn entry_kind(classification: &Classification) -> EntryKind {
    match classification {
        Classification::OnlyInA { kind } | Classification::OnlyInB { kind } => *kind,
        _ => EntryKind::File,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parts(entries: Vec<ComparisonEntry>, total_compared: usize) -> ReportParts {
        ReportParts {
            root_a: PathBuf::from("/a"),
            root_b: PathBuf::from("/b"),
            algorithm: HashAlgorithm::Blake3,
            started_at: Utc::now(),
            total_compared,
            entries,
            warnings: Vec::new(),
        }
    }

    #[test]
    fn test_rel_path_from_relative_normalizes() {
        let path = RelPath::from_relative(&Path::new("sub").join("dir").join("file.txt")).unwrap();
        assert_eq!(path.as_str(), "sub/dir/file.txt");
        assert!(RelPath::from_relative(Path::new("")).is_none());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_rel_path_keeps_non_utf8_names_distinct() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let first = RelPath::from_relative(Path::new(OsStr::from_bytes(b"f\xff"))).unwrap();
        let second = RelPath::from_relative(Path::new(OsStr::from_bytes(b"f\xfe"))).unwrap();

        assert_eq!(first.as_str(), second.as_str());
        assert_ne!(first, second);
        assert_eq!(
            first.to_native(Path::new("/root")),
            Path::new("/root").join(OsStr::from_bytes(b"f\xff"))
        );
    }

    #[test]
    fn test_rel_path_from_str_matches_from_relative() {
        let parsed = RelPath::from("/sub/file.txt/");
        let walked = RelPath::from_relative(&Path::new("sub").join("file.txt")).unwrap();
        assert_eq!(parsed, walked);
        assert_eq!(parsed.as_path(), Path::new("sub").join("file.txt"));
    }

    #[test]
    fn test_rel_path_to_native() {
        let path = RelPath::from("sub/file.txt");
        assert_eq!(
            path.to_native(Path::new("/root")),
            Path::new("/root").join("sub").join("file.txt")
        );
    }

    #[test]
    fn test_hash_algorithm_from_str() {
        assert_eq!("BLAKE3".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Blake3));
        assert_eq!("sha-256".parse::<HashAlgorithm>(), Ok(HashAlgorithm::Sha256));
        assert!("md5".parse::<HashAlgorithm>().is_err());
    }

    #[test]
    fn test_summary_counts() {
        let entries = vec![
            ComparisonEntry::new("same.txt".into(), Classification::IdenticalFile),
            ComparisonEntry::new("diff.txt".into(), Classification::DifferentFile),
            ComparisonEntry::new(
                "old.txt".into(),
                Classification::Renamed { to: "new.txt".into() },
            ),
            ComparisonEntry::unreadable("locked.bin".into(), Side::A, "permission denied"),
            ComparisonEntry::new("gone".into(), Classification::OnlyInA { kind: EntryKind::Folder }),
            ComparisonEntry::new("gone.txt".into(), Classification::OnlyInA { kind: EntryKind::File }),
            ComparisonEntry::new("extra.txt".into(), Classification::OnlyInB { kind: EntryKind::File }),
        ];

        let report = ComparisonReport::new(parts(entries, 3));
        let summary = report.summary();
        assert_eq!(summary.total_compared, 3);
        assert_eq!(summary.identical, 1);
        assert_eq!(summary.different, 1);
        assert_eq!(summary.renamed, 1);
        assert_eq!(summary.unreadable, 1);
        assert_eq!(summary.only_in_a, 2);
        assert_eq!(summary.only_in_a_folders, 1);
        assert_eq!(summary.only_in_a_files, 1);
        assert_eq!(summary.only_in_b, 1);
        assert!(!report.trees_match());

        let renames: Vec<_> = report.renames().collect();
        assert_eq!(renames.len(), 1);
        assert_eq!(renames[0].0.as_str(), "old.txt");
        assert_eq!(renames[0].1.as_str(), "new.txt");
    }

    #[test]
    fn test_empty_report_matches() {
        let report = ComparisonReport::new(parts(Vec::new(), 0));
        assert_eq!(report.summary(), &ComparisonSummary::default());
        assert!(report.trees_match());
    }

    #[test]
    fn test_find_separates_namespaces() {
        let entries = vec![
            ComparisonEntry::new("data".into(), Classification::OnlyInA { kind: EntryKind::File }),
            ComparisonEntry::new("data".into(), Classification::OnlyInB { kind: EntryKind::Folder }),
        ];
        let report = ComparisonReport::new(parts(entries, 0));

        assert!(matches!(
            report.find("data", EntryKind::File).map(|e| &e.classification),
            Some(Classification::OnlyInA { .. })
        ));
        assert!(matches!(
            report.find("data", EntryKind::Folder).map(|e| &e.classification),
            Some(Classification::OnlyInB { .. })
        ));
    }

    #[test]
    fn test_entry_serializes_with_status_tag() {
        let entry = ComparisonEntry::new(
            "old.txt".into(),
            Classification::Renamed { to: "new.txt".into() },
        );
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["path"], "old.txt");
        assert_eq!(value["status"], "renamed");
        assert_eq!(value["to"], "new.txt");
    }
}
