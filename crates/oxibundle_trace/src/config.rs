use anyhow::{Result, anyhow};
use ignore::WalkBuilder;
use log::{debug, trace};
use std::{
    collections::HashMap,
    env, fs,
    path::{Path, PathBuf},
};

use crate::constants::{BUNDLE_CONFIG_FILE_NAME, TSCONFIG_FILE_NAME};

/// Nearest ancestor of the current directory containing `.git`.
pub fn find_git_root() -> Result<PathBuf> {
    find_git_root_from(&env::current_dir()?)
}

pub fn find_git_root_from(start: &Path) -> Result<PathBuf> {
    debug!("Searching for git root from {:?}", start);
    start
        .ancestors()
        .inspect(|dir| trace!("Checking for .git in: {:?}", dir))
        .find(|dir| dir.join(".git").exists())
        .map(Path::to_path_buf)
        .ok_or_else(|| anyhow!("Could not find .git directory in any parent folder"))
}

/// `oxibundle.json` at the root, if present.
pub fn find_bundle_config(root: &Path) -> Option<PathBuf> {
    let candidate = root.join(BUNDLE_CONFIG_FILE_NAME);
    candidate.is_file().then_some(candidate)
}

/// Collects `compilerOptions.paths` aliases from every tsconfig under `root`.
///
/// Trailing `/*` is stripped from aliases and targets, and targets are made
/// absolute against the tsconfig's `baseUrl`.
pub fn read_tsconfig_paths(root: &Path) -> HashMap<String, Vec<String>> {
    debug!("Reading tsconfig paths from root: {:?}", root);
    let walker = WalkBuilder::new(root).hidden(false).git_ignore(true).build();

    let mut paths = HashMap::new();
    for entry in walker.filter_map(|e| e.ok()) {
        let path = entry.path();
        if path.file_name().and_then(|n| n.to_str()) != Some(TSCONFIG_FILE_NAME) {
            continue;
        }
        trace!("Found tsconfig at: {:?}", path);
        if let Ok(content) = fs::read_to_string(path) {
            paths.extend(parse_tsconfig_paths(&content, path.parent().unwrap_or(root)));
        }
    }

    debug!("Loaded {} tsconfig path aliases", paths.len());
    paths
}

/// Aliases declared by one tsconfig located in `dir`.
pub fn parse_tsconfig_paths(content: &str, dir: &Path) -> HashMap<String, Vec<String>> {
    let stripped = strip_json_comments(content);

    let mut paths = HashMap::new();
    let Ok(json) = serde_json::from_str::<serde_json::Value>(&stripped) else {
        trace!("Skipping unparseable tsconfig in {:?}", dir);
        return paths;
    };
    let Some(compiler_options) = json.get("compilerOptions") else {
        return paths;
    };
    let Some(paths_obj) = compiler_options.get("paths").and_then(|p| p.as_object()) else {
        return paths;
    };

    let base_url = compiler_options.get("baseUrl").and_then(|b| b.as_str()).unwrap_or(".");
    let base_path = dir.join(base_url);

    for (alias, targets) in paths_obj {
        let resolved: Vec<String> = targets
            .as_array()
            .into_iter()
            .flatten()
            .filter_map(|t| t.as_str())
            .map(|t| base_path.join(t.trim_end_matches("/*")).to_string_lossy().to_string())
            .collect();
        if !resolved.is_empty() {
            let alias_key = alias.trim_end_matches("/*").to_string();
            trace!("Found tsconfig path alias: '{}' -> {:?}", alias_key, resolved);
            paths.insert(alias_key, resolved);
        }
    }
    paths
}

/// Removes `//` and `/* */` comments that sit outside string literals.
fn strip_json_comments(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            match c {
                '\\' => {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                }
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match (c, chars.peek()) {
            ('"', _) => {
                in_string = true;
                out.push(c);
            }
            ('/', Some('/')) => {
                while chars.next_if(|&n| n != '\n').is_some() {}
            }
            ('/', Some('*')) => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
            }
            _ => out.push(c),
        }
    }
    out
}
