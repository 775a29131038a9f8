use dashmap::DashMap;
use log::{debug, trace};
use path_clean::clean;
use serde_json::Value;
use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
};

use crate::constants::{EXPORT_CONDITIONS, INDEX_FILES, MAIN_FIELDS, RESOLVE_EXTENSIONS};

/// Node-style module resolution with tsconfig `paths` aliases.
pub struct Resolver {
    root: PathBuf,
    /// Aliases sorted longest first so the most specific one wins
    aliases: Vec<(String, Vec<String>)>,
    cache: DashMap<(PathBuf, String), Option<PathBuf>>,
}

impl Resolver {
    pub fn new(root: PathBuf, tsconfig_paths: HashMap<String, Vec<String>>) -> Self {
        let mut aliases: Vec<_> = tsconfig_paths.into_iter().collect();
        aliases.sort_by(|(a, _), (b, _)| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        Self { root, aliases, cache: DashMap::new() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolves `request` as seen from `from_file`. `None` for builtins and
    /// anything that cannot be found on disk.
    pub fn resolve(&self, from_file: &Path, request: &str) -> Option<PathBuf> {
        let key = (from_file.to_path_buf(), request.to_string());
        if let Some(v) = self.cache.get(&key) {
            trace!("Cache hit for resolve: '{}' from {}", request, from_file.display());
            return v.clone();
        }

        let base = from_file.parent().unwrap_or(&self.root);
        let resolved = if is_path_request(request) {
            trace!("Resolving '{}' as a path", request);
            resolve_file(Path::new(&clean(base.join(request).to_string_lossy().to_string())))
        } else {
            self.resolve_alias(request).or_else(|| self.resolve_package(base, request))
        };

        match &resolved {
            Some(p) => debug!("Resolved '{}' from {} to {}", request, from_file.display(), p.display()),
            None => trace!("Could not resolve '{}' from {}", request, from_file.display()),
        }
        self.cache.insert(key, resolved.clone());
        resolved
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    fn resolve_alias(&self, request: &str) -> Option<PathBuf> {
        for (alias, targets) in &self.aliases {
            let remainder = if request == alias {
                ""
            } else if let Some(rest) = request.strip_prefix(alias.as_str())
                && let Some(rest) = rest.strip_prefix('/')
            {
                rest
            } else {
                continue;
            };
            trace!("Matched alias '{}' for request '{}'", alias, request);

            for target in targets {
                let candidate = if remainder.is_empty() {
                    PathBuf::from(target)
                } else {
                    Path::new(target).join(remainder)
                };
                if let Some(resolved) = resolve_file(&candidate) {
                    return Some(resolved);
                }
            }
        }
        None
    }

    /// Walks up from `start_dir` to the root looking in `node_modules`.
    fn resolve_package(&self, start_dir: &Path, request: &str) -> Option<PathBuf> {
        let mut current = start_dir;
        loop {
            let candidate = current.join("node_modules").join(request);
            if let Some(resolved) = resolve_package_path(&candidate) {
                return Some(resolved);
            }
            if current == self.root {
                return None;
            }
            current = current.parent()?;
        }
    }
}

fn is_path_request(request: &str) -> bool {
    request.starts_with("./") || request.starts_with("../") || request.starts_with('/')
}

fn resolve_file(p: &Path) -> Option<PathBuf> {
    if p.is_file() {
        return Some(canonical(p.to_path_buf()));
    }

    RESOLVE_EXTENSIONS
        .iter()
        .map(|ext| PathBuf::from(format!("{}.{}", p.display(), ext)))
        .chain(INDEX_FILES.iter().map(|index| p.join(index)))
        .find(|candidate| candidate.is_file())
        .map(canonical)
}

fn canonical(p: PathBuf) -> PathBuf {
    p.canonicalize().unwrap_or(p)
}

/// A path inside `node_modules`: either a package directory described by its
/// `package.json` or a file below one.
fn resolve_package_path(nm: &Path) -> Option<PathBuf> {
    if !nm.exists() {
        return resolve_file(nm);
    }
    trace!("Checking package at: {:?}", nm);

    let manifest = nm.join("package.json");
    if let Ok(txt) = fs::read_to_string(&manifest)
        && let Ok(v) = serde_json::from_str::<Value>(&txt)
        && let Some(entry) = package_entries(&v).find_map(|entry| resolve_file(&nm.join(entry)))
    {
        return Some(entry);
    }

    resolve_file(nm)
}

/// Candidate entry points of a package manifest in priority order.
fn package_entries(manifest: &Value) -> impl Iterator<Item = String> + '_ {
    let exports = manifest.get("exports");
    let dot = exports.and_then(|e| e.as_object()).and_then(|o| o.get("."));

    let from_exports = exports
        .and_then(Value::as_str)
        .into_iter()
        .chain(dot.and_then(Value::as_str))
        .chain(
            EXPORT_CONDITIONS
                .iter()
                .filter_map(move |cond| dot.and_then(|d| d.get(*cond)).and_then(Value::as_str)),
        );
    let from_fields = MAIN_FIELDS.iter().filter_map(|field| manifest.get(*field)?.as_str());

    from_exports.chain(from_fields).map(|s| s.trim_start_matches("./").to_string())
}
