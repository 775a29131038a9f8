use anyhow::{Context, Result};
use dashmap::DashMap;
use log::{debug, trace};
use std::{
    fs,
    path::{Path, PathBuf},
    time::SystemTime,
};

use oxibundle_core::{FileAccessor, FileRecord, Transformed, extract_inline_map, identity_map};

/// Loads source files from disk.
///
/// Code is passed through untouched. A trailing inline source map is used as
/// the file's map and stripped from the code, otherwise every line maps to
/// itself. Results are cached until the file's modification time changes.
pub struct SourceLoader {
    root: PathBuf,
    cache: DashMap<PathBuf, (Option<SystemTime>, Transformed)>,
}

impl SourceLoader {
    pub fn new(root: PathBuf) -> Self {
        Self { root, cache: DashMap::new() }
    }

    /// Name recorded in source maps, relative to the root when possible.
    fn source_name(&self, path: &Path) -> String {
        path.strip_prefix(&self.root).unwrap_or(path).to_string_lossy().to_string()
    }

    fn load(&self, path: &Path) -> Result<Transformed> {
        let src =
            fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let transformed = match extract_inline_map(&src)
            .with_context(|| format!("Bad inline source map in {}", path.display()))?
        {
            Some((code, map)) => {
                trace!("Using inline source map of {}", path.display());
                Transformed { code, map }
            }
            None => Transformed { map: identity_map(&self.source_name(path), &src), code: src },
        };
        Ok(transformed)
    }
}

impl FileAccessor for SourceLoader {
    fn file(&self, path: &Path) -> Result<FileRecord> {
        let modified = fs::metadata(path).and_then(|m| m.modified()).ok();
        if let Some(entry) = self.cache.get(path)
            && modified.is_some()
            && entry.0 == modified
        {
            trace!("Cache hit for source: {}", path.display());
            return Ok(FileRecord { path: path.to_path_buf(), transformed: entry.1.clone() });
        }

        debug!("Loading source {}", path.display());
        let transformed = self.load(path)?;
        self.cache.insert(path.to_path_buf(), (modified, transformed.clone()));
        Ok(FileRecord { path: path.to_path_buf(), transformed })
    }
}
