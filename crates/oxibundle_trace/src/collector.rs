use anyhow::Result;
use ignore::WalkBuilder;
use log::{debug, trace};
use std::path::{Path, PathBuf};

use oxibundle_core::matches_pattern;

use crate::constants::JS_TS_EXTENSIONS;

/// Default glob for entry files: top-level files under `src`.
pub const DEFAULT_ENTRY_GLOB: &str = "src/*";

/// Walks `root` (honoring ignore files) for JS/TS files whose path relative to
/// the root matches `entry_glob`. Test files are skipped. Sorted by path.
pub fn collect_entries(root: &Path, entry_glob: &str) -> Result<Vec<PathBuf>> {
    debug!("Collecting entry files matching '{}' under {}", entry_glob, root.display());
    let walker = WalkBuilder::new(root)
        .hidden(false)
        .ignore(true)
        .git_ignore(true)
        .sort_by_file_name(|a, b| a.cmp(b))
        .build();

    let mut files = Vec::new();
    for res in walker {
        let dent = res?;
        let p = dent.path();
        if !p.is_file() {
            continue;
        }

        let path_str = p.to_string_lossy();
        if path_str.contains(".test.") || path_str.contains(".spec.") {
            trace!("Skipping test file: {}", path_str);
            continue;
        }

        let is_source = p
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| JS_TS_EXTENSIONS.contains(&ext));
        if is_source
            && let Ok(rel_path) = p.strip_prefix(root)
            && matches_pattern(rel_path, entry_glob)
        {
            trace!("Matched entry file with glob '{}': {}", entry_glob, rel_path.display());
            files.push(p.to_path_buf());
        }
    }

    files.sort();
    debug!("Collected {} entry files", files.len());
    Ok(files)
}
