use anyhow::{Context, Result};
use glob::{MatchOptions, Pattern};
use log::{debug, trace, warn};
use std::path::{Path, PathBuf};

use crate::types::PathSet;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

fn has_magic(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expands glob patterns into concrete paths.
///
/// A pattern is taken literally when it has no glob syntax, when it names an
/// existing path (`pages/[id].js`), or when it matches nothing. Results are
/// de-duplicated and keep first-seen order.
pub fn expand_patterns<S: AsRef<str>>(patterns: &[S]) -> Result<Vec<PathBuf>> {
    let mut out = PathSet::new();
    for pattern in patterns {
        let pattern = pattern.as_ref();
        if !has_magic(pattern) || Path::new(pattern).exists() {
            out.insert(PathBuf::from(pattern));
            continue;
        }

        trace!("Expanding pattern '{}'", pattern);
        let entries =
            glob::glob(pattern).with_context(|| format!("Invalid glob pattern '{}'", pattern))?;
        let mut matched = false;
        for entry in entries {
            match entry {
                Ok(path) => {
                    trace!("Pattern '{}' matched {}", pattern, path.display());
                    out.insert(path);
                    matched = true;
                }
                Err(e) => warn!("Skipping unreadable path while expanding '{}': {}", pattern, e),
            }
        }
        if !matched {
            debug!("Pattern '{}' matched nothing, keeping it as a path", pattern);
            out.insert(PathBuf::from(pattern));
        }
    }
    debug!("Expanded {} patterns into {} paths", patterns.len(), out.len());
    Ok(out.into_iter().collect())
}

/// Same as [`expand_patterns`] for inputs that are already paths.
pub fn expand_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let patterns: Vec<String> = paths.iter().map(|p| p.to_string_lossy().to_string()).collect();
    expand_patterns(&patterns)
}

/// Tests a path against a glob pattern. `*` does not cross `/`.
pub fn matches_pattern(path: &Path, pattern: &str) -> bool {
    match Pattern::new(pattern) {
        Ok(p) => p.matches_path_with(path, MATCH_OPTIONS),
        Err(e) => {
            warn!("Invalid glob pattern '{}': {}", pattern, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_literal_paths_kept_in_order() {
        let paths = expand_patterns(&["b.js", "a.js", "b.js"]).unwrap();
        assert_eq!(paths, vec![PathBuf::from("b.js"), PathBuf::from("a.js")]);
    }

    #[test]
    fn test_glob_expansion() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.js"), "").unwrap();
        fs::write(root.join("b.js"), "").unwrap();
        fs::write(root.join("c.css"), "").unwrap();

        let pattern = format!("{}/*.js", root.display());
        let paths = expand_patterns(&[pattern]).unwrap();
        assert_eq!(paths, vec![root.join("a.js"), root.join("b.js")]);
    }

    #[test]
    fn test_glob_without_matches_is_kept_literally() {
        let temp_dir = TempDir::new().unwrap();
        let pattern = format!("{}/*.js", temp_dir.path().display());
        assert_eq!(expand_patterns(&[pattern.clone()]).unwrap(), vec![PathBuf::from(pattern)]);
    }

    #[test]
    fn test_existing_path_with_brackets_is_not_globbed() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::create_dir_all(root.join("pages")).unwrap();
        fs::write(root.join("pages/[id].js"), "").unwrap();
        fs::write(root.join("pages/i.js"), "").unwrap();

        let route = root.join("pages/[id].js");
        assert_eq!(expand_paths(std::slice::from_ref(&route)).unwrap(), vec![route]);
    }

    #[test]
    fn test_escaped_pattern_matches_bracket_name() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("[id].js"), "").unwrap();

        let escaped = format!("{}/{}", root.display(), Pattern::escape("[id].js"));
        assert_eq!(expand_patterns(&[escaped]).unwrap(), vec![root.join("[id].js")]);
    }

    #[test]
    fn test_matches_pattern() {
        assert!(matches_pattern(Path::new("src/main.js"), "src/*.js"));
        assert!(matches_pattern(Path::new("src/main.js"), "src/main.js"));
        assert!(matches_pattern(Path::new("src/app/main.js"), "**/main.js"));
        assert!(!matches_pattern(Path::new("src/app/main.js"), "src/*.js"));
        assert!(!matches_pattern(Path::new("src/main.js"), "[invalid"));
    }
}
