//! In-memory collaborators for unit tests.

use anyhow::{Result, anyhow};
use std::{
    collections::{HashMap, HashSet},
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{
    collaborators::{Events, FileAccessor, FileSystem, Tracer},
    source_map::identity_map,
    types::{BundleEvent, FileRecord, TracedFile, Transformed},
};

pub fn paths(items: &[&str]) -> Vec<PathBuf> {
    items.iter().map(PathBuf::from).collect()
}

/// Tracer over a fixed import graph. Each path is traced depth-first,
/// dependencies before dependents. Unknown paths are leaves.
#[derive(Default)]
pub struct FakeTracer {
    graph: HashMap<PathBuf, Vec<PathBuf>>,
    failing: HashSet<PathBuf>,
    calls: Mutex<Vec<Vec<PathBuf>>>,
}

impl FakeTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str, deps: &[&str]) -> Self {
        self.graph.insert(PathBuf::from(path), paths(deps));
        self
    }

    pub fn failing(mut self, path: &str) -> Self {
        self.failing.insert(PathBuf::from(path));
        self
    }

    /// Every argument list the tracer was called with.
    pub fn calls(&self) -> Vec<Vec<PathBuf>> {
        self.calls.lock().unwrap().clone()
    }

    fn visit(&self, path: &Path, seen: &mut HashSet<PathBuf>, out: &mut Vec<TracedFile>) {
        if !seen.insert(path.to_path_buf()) {
            return;
        }
        let deps = self.graph.get(path).cloned().unwrap_or_default();
        for dep in &deps {
            self.visit(dep, seen, out);
        }
        out.push(TracedFile { path: path.to_path_buf(), dependencies: deps });
    }
}

impl Tracer for FakeTracer {
    fn trace(&self, paths: &[PathBuf]) -> Result<Vec<TracedFile>> {
        self.calls.lock().unwrap().push(paths.to_vec());
        let mut out = Vec::new();
        for path in paths {
            if self.failing.contains(path) {
                return Err(anyhow!("cannot trace {}", path.display()));
            }
            self.visit(path, &mut HashSet::new(), &mut out);
        }
        Ok(out)
    }
}

/// Serves fixed code with an identity map.
#[derive(Default)]
pub struct FakeFiles {
    code: HashMap<PathBuf, String>,
}

impl FakeFiles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(mut self, path: &str, code: &str) -> Self {
        self.code.insert(PathBuf::from(path), code.to_string());
        self
    }
}

impl FileAccessor for FakeFiles {
    fn file(&self, path: &Path) -> Result<FileRecord> {
        let code =
            self.code.get(path).ok_or_else(|| anyhow!("no such file: {}", path.display()))?;
        Ok(FileRecord {
            path: path.to_path_buf(),
            transformed: Transformed {
                code: code.clone(),
                map: identity_map(&path.to_string_lossy(), code),
            },
        })
    }
}

#[derive(Default)]
pub struct FakeFs {
    existing: HashSet<PathBuf>,
}

impl FakeFs {
    pub fn with(paths: &[&str]) -> Self {
        Self { existing: paths.iter().map(PathBuf::from).collect() }
    }
}

impl FileSystem for FakeFs {
    fn exists(&self, path: &Path) -> bool {
        self.existing.contains(path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recorded {
    pub path: PathBuf,
    pub index: usize,
    pub traced: Vec<PathBuf>,
    pub bundled: Vec<PathBuf>,
}

#[derive(Default)]
pub struct RecordingEvents {
    pub events: Mutex<Vec<Recorded>>,
}

impl RecordingEvents {
    pub fn recorded(&self) -> Vec<Recorded> {
        self.events.lock().unwrap().clone()
    }
}

impl Events for RecordingEvents {
    fn emit(&self, event: &BundleEvent<'_>) {
        let BundleEvent::Compile { path, index, traced, bundled } = event;
        self.events.lock().unwrap().push(Recorded {
            path: path.to_path_buf(),
            index: *index,
            traced: traced.to_vec(),
            bundled: bundled.to_vec(),
        });
    }
}
