//! Filesystem-backed collaborators for oxibundle.
//!
//! This crate provides:
//! - An import tracer for JavaScript/TypeScript built on the oxc parser
//! - Module resolution (relative, node_modules, tsconfig paths)
//! - A source loader producing identity or embedded source maps
//! - Entry collection and project configuration discovery

mod collector;
mod config;
mod constants;
mod loader;
mod parser;
mod resolver;
mod tracer;
mod types;

use std::{collections::HashMap, path::PathBuf, sync::Arc};

use oxibundle_core::{Collaborators, LogEvents};

// Re-export public API
pub use collector::{DEFAULT_ENTRY_GLOB, collect_entries};
pub use config::{
    find_bundle_config, find_git_root, find_git_root_from, parse_tsconfig_paths,
    read_tsconfig_paths,
};
pub use constants::{BUNDLE_CONFIG_FILE_NAME, INDEX_FILES, JS_TS_EXTENSIONS, RESOLVE_EXTENSIONS};
pub use loader::SourceLoader;
pub use parser::{imports_for, parse_imports};
pub use resolver::Resolver;
pub use tracer::ImportTracer;
pub use types::{SpecKind, Specifier};

/// Collaborators rooted at `root`: the oxc tracer, the disk loader, the real
/// filesystem and log-backed events.
pub fn disk_collaborators(
    root: PathBuf,
    tsconfig_paths: HashMap<String, Vec<String>>,
) -> Collaborators {
    let tracer = ImportTracer::new(Resolver::new(root.clone(), tsconfig_paths));
    Collaborators::new(Arc::new(tracer), Arc::new(SourceLoader::new(root)))
        .with_events(Arc::new(LogEvents))
}
