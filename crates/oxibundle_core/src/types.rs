use indexmap::IndexSet;
use sourcemap::SourceMap;
use std::path::PathBuf;

/// Insertion-ordered set of paths with O(1) membership.
pub type PathSet = IndexSet<PathBuf>;

/// A single hit produced by a [`Tracer`](crate::Tracer).
///
/// Two traced files are the same file iff their paths are equal. A tracer may
/// return the same path several times across the traces of different entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TracedFile {
    pub path: PathBuf,
    /// Direct dependencies the tracer resolved for this file
    pub dependencies: Vec<PathBuf>,
}

impl TracedFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), dependencies: Vec::new() }
    }
}

/// Output of the per-file transform step.
#[derive(Debug, Clone)]
pub struct Transformed {
    pub code: String,
    pub map: SourceMap,
}

#[derive(Debug, Clone)]
pub struct FileRecord {
    pub path: PathBuf,
    pub transformed: Transformed,
}

/// Notification emitted while assembling output. Observability only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BundleEvent<'a> {
    Compile { path: &'a PathBuf, index: usize, traced: &'a [PathBuf], bundled: &'a [PathBuf] },
}

impl BundleEvent<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            BundleEvent::Compile { .. } => "compile",
        }
    }
}
