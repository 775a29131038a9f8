//! File-object adapters so a build pipeline can push files through a bundle
//! one at a time.

use anyhow::Result;
use log::trace;
use std::path::PathBuf;

use crate::bundle::Bundle;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileObject {
    pub path: PathBuf,
    pub contents: String,
}

impl FileObject {
    pub fn new(path: impl Into<PathBuf>, contents: impl Into<String>) -> Self {
        Self { path: path.into(), contents: contents.into() }
    }
}

/// A synchronous per-file transform. Hosts wrap it in whatever async or
/// channel idiom their pipeline uses.
pub trait FileStream {
    fn transform(&mut self, file: FileObject) -> Result<FileObject>;
}

/// Replaces contents with the compiled bundle for the file's path.
pub struct CompileStream<'a> {
    bundle: &'a Bundle,
}

impl<'a> CompileStream<'a> {
    pub fn new(bundle: &'a Bundle) -> Self {
        Self { bundle }
    }
}

impl FileStream for CompileStream<'_> {
    fn transform(&mut self, mut file: FileObject) -> Result<FileObject> {
        trace!("Compiling stream file {}", file.path.display());
        file.contents = self.bundle.compile(Some(std::slice::from_ref(&file.path)))?;
        Ok(file)
    }
}

/// Replaces contents with the file's own transformed code.
pub struct CompileOneStream<'a> {
    bundle: &'a Bundle,
}

impl<'a> CompileOneStream<'a> {
    pub fn new(bundle: &'a Bundle) -> Self {
        Self { bundle }
    }
}

impl FileStream for CompileOneStream<'_> {
    fn transform(&mut self, mut file: FileObject) -> Result<FileObject> {
        trace!("Compiling single stream file {}", file.path.display());
        file.contents = self.bundle.compile_one(&file.path)?;
        Ok(file)
    }
}

pub struct PassThrough;

impl FileStream for PassThrough {
    fn transform(&mut self, file: FileObject) -> Result<FileObject> {
        Ok(file)
    }
}

/// Drives `files` through `stream` in order, stopping at the first error.
pub fn pipe<S, I>(stream: &mut S, files: I) -> Result<Vec<FileObject>>
where
    S: FileStream + ?Sized,
    I: IntoIterator<Item = FileObject>,
{
    files.into_iter().map(|file| stream.transform(file)).collect()
}
