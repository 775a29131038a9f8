use anyhow::Result;
use log::{debug, info};
use std::path::{Path, PathBuf};

use crate::{
    collaborators::{Collaborators, WatchCallback},
    config::BundleOptions,
    destination::{destinations_of, resolve_common_destination},
    partition::{Partition, partition},
    pattern::expand_patterns,
    stream::{CompileOneStream, CompileStream, FileStream, PassThrough},
    types::PathSet,
};

/// A set of entry files and the partition of their dependency graph.
///
/// The partition is computed once at construction. Compiling re-traces every
/// entry so content changes are picked up, but a change to the import graph
/// itself needs [`Bundle::reinit`] or a new bundle.
pub struct Bundle {
    pub(crate) options: BundleOptions,
    pub(crate) collaborators: Collaborators,
    pub(crate) files: Vec<PathBuf>,
    pub(crate) entries: PathSet,
    pub(crate) partition: Partition,
    pub(crate) traced: PathSet,
    pub(crate) common_destination: Option<PathBuf>,
}

impl Bundle {
    /// Expands `patterns` into entry files and partitions their graph.
    pub fn new<S: AsRef<str>>(
        collaborators: Collaborators,
        patterns: &[S],
        options: BundleOptions,
    ) -> Result<Self> {
        let files = expand_patterns(patterns)?;
        info!("Creating bundle with {} entry files", files.len());
        let mut bundle = Self {
            options,
            collaborators,
            entries: files.iter().cloned().collect(),
            files,
            partition: Partition::default(),
            traced: PathSet::new(),
            common_destination: None,
        };
        bundle.reinit()?;
        Ok(bundle)
    }

    /// Recomputes the partition and common destination from a fresh trace.
    pub fn reinit(&mut self) -> Result<&Self> {
        self.partition =
            partition(&self.files, self.collaborators.tracer.as_ref(), &self.options.common)?;
        self.traced = self.partition.all.iter().cloned().collect();
        self.common_destination = resolve_common_destination(
            &self.files,
            &self.options.common,
            self.collaborators.fs.as_ref(),
        );
        debug!(
            "Bundle initialized: {} traced, {} common, {} uncommon, destination {:?}",
            self.partition.all.len(),
            self.partition.common.len(),
            self.partition.uncommon.len(),
            self.common_destination
        );
        Ok(self)
    }

    pub fn options(&self) -> &BundleOptions {
        &self.options
    }

    /// Entry files in the order they were expanded.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Every hit of the construction-time trace, duplicates included.
    pub fn all(&self) -> &[PathBuf] {
        &self.partition.all
    }

    pub fn common(&self) -> &PathSet {
        &self.partition.common
    }

    /// Files reached from more than one entry, whether or not they are
    /// extracted.
    pub fn shared(&self) -> &PathSet {
        &self.partition.shared
    }

    pub fn uncommon(&self) -> &PathSet {
        &self.partition.uncommon
    }

    pub fn common_destination(&self) -> Option<&Path> {
        self.common_destination.as_deref()
    }

    pub fn is_entry(&self, path: &Path) -> bool {
        self.entries.contains(path)
    }

    /// Where the output containing `path` goes.
    pub fn destinations(&self, path: &Path) -> Result<Vec<PathBuf>> {
        destinations_of(
            path,
            &self.files,
            &self.partition.common,
            self.common_destination(),
            self.collaborators.tracer.as_ref(),
        )
    }

    /// Stream that replaces each file's contents with its compiled bundle.
    pub fn stream(&self) -> CompileStream<'_> {
        CompileStream::new(self)
    }

    /// Stream that replaces each file's contents with its own transformed code.
    pub fn stream_one(&self) -> CompileOneStream<'_> {
        CompileOneStream::new(self)
    }

    pub fn watch(&self, callback: WatchCallback) -> Result<Box<dyn FileStream + '_>> {
        self.collaborators.watcher.watch(self, callback)
    }

    /// Watches only when `condition` holds, otherwise passes files through.
    pub fn watch_if(
        &self,
        condition: bool,
        callback: WatchCallback,
    ) -> Result<Box<dyn FileStream + '_>> {
        if condition { self.watch(callback) } else { Ok(Box::new(PassThrough)) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        collaborators::Watcher,
        config::CommonOption,
        stream::FileObject,
        test_support::{FakeFiles, FakeFs, FakeTracer, paths},
    };
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    fn bundle(tracer: FakeTracer, fs: FakeFs, common: CommonOption) -> Bundle {
        let collaborators = Collaborators::new(Arc::new(tracer), Arc::new(FakeFiles::new()))
            .with_fs(Arc::new(fs));
        Bundle::new(
            collaborators,
            &["a.js", "b.js"],
            BundleOptions { common, ..BundleOptions::default() },
        )
        .unwrap()
    }

    fn shared_graph() -> FakeTracer {
        FakeTracer::new().file("a.js", &["shared.js"]).file("b.js", &["shared.js"])
    }

    #[test]
    fn test_disabled_common_keeps_shared_files_uncommon() {
        let b = bundle(shared_graph(), FakeFs::default(), CommonOption::Disabled);
        assert_eq!(b.files(), paths(&["a.js", "b.js"]).as_slice());
        assert!(b.common().is_empty());
        assert!(b.uncommon().contains(Path::new("shared.js")));
        assert!(b.shared().contains(Path::new("shared.js")));
        assert_eq!(b.common_destination(), None);
    }

    #[test]
    fn test_common_with_destination() {
        let b = bundle(
            shared_graph(),
            FakeFs::with(&["common.js"]),
            CommonOption::Pattern("common.js".to_string()),
        );
        assert_eq!(b.common().iter().cloned().collect::<Vec<_>>(), paths(&["shared.js"]));
        assert!(!b.uncommon().contains(Path::new("shared.js")));
        assert_eq!(b.common_destination(), Some(Path::new("common.js")));
        assert_eq!(b.destinations(Path::new("shared.js")).unwrap(), paths(&["common.js"]));
    }

    #[test]
    fn test_destinations_without_common_destination() {
        let b = bundle(shared_graph(), FakeFs::default(), CommonOption::Enabled);
        assert_eq!(b.destinations(Path::new("shared.js")).unwrap(), paths(&["a.js", "b.js"]));
        assert_eq!(b.destinations(Path::new("b.js")).unwrap(), paths(&["b.js"]));
        assert!(b.destinations(Path::new("missing.js")).unwrap().is_empty());
    }

    #[test]
    fn test_reinit_is_stable() {
        let mut b = bundle(shared_graph(), FakeFs::default(), CommonOption::Enabled);
        let common: Vec<_> = b.common().iter().cloned().collect();
        let uncommon: Vec<_> = b.uncommon().iter().cloned().collect();
        b.reinit().unwrap();
        assert_eq!(b.common().iter().cloned().collect::<Vec<_>>(), common);
        assert_eq!(b.uncommon().iter().cloned().collect::<Vec<_>>(), uncommon);
    }

    #[test]
    fn test_construction_fails_when_tracing_fails() {
        let collaborators = Collaborators::new(
            Arc::new(FakeTracer::new().failing("a.js")),
            Arc::new(FakeFiles::new()),
        );
        assert!(Bundle::new(collaborators, &["a.js"], BundleOptions::default()).is_err());
    }

    #[test]
    fn test_watch_if_false_passes_through() {
        let b = bundle(shared_graph(), FakeFs::default(), CommonOption::Disabled);
        let mut stream = b.watch_if(false, Box::new(|_| Ok(()))).unwrap();
        let file = FileObject::new("a.js", "untouched");
        assert_eq!(stream.transform(file.clone()).unwrap(), file);
    }

    #[test]
    fn test_watch_without_watcher_fails() {
        let b = bundle(shared_graph(), FakeFs::default(), CommonOption::Disabled);
        assert!(b.watch(Box::new(|_| Ok(()))).is_err());
    }

    struct CountingWatcher {
        calls: AtomicUsize,
    }

    impl Watcher for CountingWatcher {
        fn watch<'a>(
            &self,
            bundle: &'a Bundle,
            callback: WatchCallback,
        ) -> Result<Box<dyn FileStream + 'a>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            callback(&bundle.files()[0])?;
            Ok(Box::new(PassThrough))
        }
    }

    #[test]
    fn test_watch_delegates_to_watcher() {
        let watcher = Arc::new(CountingWatcher { calls: AtomicUsize::new(0) });
        let collaborators =
            Collaborators::new(Arc::new(shared_graph()), Arc::new(FakeFiles::new()))
                .with_watcher(watcher.clone());
        let b = Bundle::new(collaborators, &["a.js", "b.js"], BundleOptions::default()).unwrap();

        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_callback = Arc::clone(&seen);
        b.watch_if(
            true,
            Box::new(move |_| {
                seen_in_callback.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        )
        .unwrap();

        assert_eq!(watcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
