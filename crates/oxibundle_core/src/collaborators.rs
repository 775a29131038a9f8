//! Interfaces the bundle consumes from the outside world.
//!
//! Tracing, per-file transformation, filesystem checks, event delivery and
//! watching are all injected through [`Collaborators`] so tests can swap in
//! in-memory fakes.

use anyhow::{Result, anyhow};
use log::debug;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    bundle::Bundle,
    stream::FileStream,
    types::{BundleEvent, FileRecord, TracedFile},
};

/// Resolves the dependency closure of one or more files.
///
/// Implementations must return finite, acyclic sequences. A batch trace is
/// the concatenation of the per-path traces, so a file reached from two
/// entries shows up twice.
pub trait Tracer: Send + Sync {
    fn trace(&self, paths: &[PathBuf]) -> Result<Vec<TracedFile>>;

    fn trace_one(&self, path: &Path) -> Result<Vec<TracedFile>> {
        self.trace(&[path.to_path_buf()])
    }
}

/// Returns the transformed code and map of a file.
pub trait FileAccessor: Send + Sync {
    fn file(&self, path: &Path) -> Result<FileRecord>;
}

pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
}

/// Side-channel for observability.
pub trait Events: Send + Sync {
    fn emit(&self, event: &BundleEvent<'_>);
}

pub type WatchCallback = Box<dyn Fn(&Path) -> Result<()> + Send + Sync>;

/// Rebuild scheduling lives entirely behind this trait.
pub trait Watcher: Send + Sync {
    fn watch<'a>(
        &self,
        bundle: &'a Bundle,
        callback: WatchCallback,
    ) -> Result<Box<dyn FileStream + 'a>>;
}

pub struct StdFileSystem;

impl FileSystem for StdFileSystem {
    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

pub struct NullEvents;

impl Events for NullEvents {
    fn emit(&self, _event: &BundleEvent<'_>) {}
}

/// Logs every event at debug level.
pub struct LogEvents;

impl Events for LogEvents {
    fn emit(&self, event: &BundleEvent<'_>) {
        match event {
            BundleEvent::Compile { path, index, traced, bundled } => {
                debug!(
                    "{}: {} ({}/{}) for {} bundled entries",
                    event.name(),
                    path.display(),
                    index + 1,
                    traced.len(),
                    bundled.len()
                );
            }
        }
    }
}

/// Used when no watcher was injected.
pub struct NoWatcher;

impl Watcher for NoWatcher {
    fn watch<'a>(
        &self,
        _bundle: &'a Bundle,
        _callback: WatchCallback,
    ) -> Result<Box<dyn FileStream + 'a>> {
        Err(anyhow!("No watcher configured for this bundle"))
    }
}

#[derive(Clone)]
pub struct Collaborators {
    pub events: Arc<dyn Events>,
    pub files: Arc<dyn FileAccessor>,
    pub fs: Arc<dyn FileSystem>,
    pub tracer: Arc<dyn Tracer>,
    pub watcher: Arc<dyn Watcher>,
}

impl Collaborators {
    /// Defaults to the real filesystem, no events and no watcher.
    pub fn new(tracer: Arc<dyn Tracer>, files: Arc<dyn FileAccessor>) -> Self {
        Self {
            events: Arc::new(NullEvents),
            files,
            fs: Arc::new(StdFileSystem),
            tracer,
            watcher: Arc::new(NoWatcher),
        }
    }

    pub fn with_events(mut self, events: Arc<dyn Events>) -> Self {
        self.events = events;
        self
    }

    pub fn with_fs(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_watcher(mut self, watcher: Arc<dyn Watcher>) -> Self {
        self.watcher = watcher;
        self
    }
}
