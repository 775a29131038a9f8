//! Core of the oxibundle module bundler.
//!
//! Given entry files and a dependency tracer, this crate:
//! - Partitions the traced graph into files shared between entries (common)
//!   and files unique to a single entry (uncommon)
//! - Resolves where each traced file ends up
//! - Concatenates transformed code and merges the per-file source maps
//!
//! Tracing and per-file transformation are injected through
//! [`Collaborators`].
//!
//! # Examples
//!
//! ```no_run
//! use oxibundle_core::{Bundle, BundleOptions, Collaborators, FileAccessor, Tracer};
//! use std::sync::Arc;
//!
//! # fn run(tracer: Arc<dyn Tracer>, files: Arc<dyn FileAccessor>) -> anyhow::Result<()> {
//! let bundle = Bundle::new(
//!     Collaborators::new(tracer, files),
//!     &["src/pages/*.js"],
//!     BundleOptions::default(),
//! )?;
//! let output = bundle.compile(None)?;
//! println!("{}", output);
//! # Ok(())
//! # }
//! ```

mod bundle;
mod collaborators;
mod compile;
mod config;
mod destination;
mod partition;
mod pattern;
mod source_map;
mod stream;
mod types;

#[cfg(test)]
mod test_support;

// Re-export public API
pub use bundle::Bundle;
pub use collaborators::{
    Collaborators, Events, FileAccessor, FileSystem, LogEvents, NoWatcher, NullEvents,
    StdFileSystem, Tracer, WatchCallback, Watcher,
};
pub use compile::Compiled;
pub use config::{BundleOptions, CommonOption, DEFAULT_JOINER};
pub use destination::{destinations_of, resolve_common_destination};
pub use partition::{Partition, partition};
pub use pattern::{expand_paths, expand_patterns, matches_pattern};
pub use source_map::{CombinedSourceMap, extract_inline_map, identity_map, line_count, to_comment};
pub use stream::{CompileOneStream, CompileStream, FileObject, FileStream, PassThrough, pipe};
pub use types::{BundleEvent, FileRecord, PathSet, TracedFile, Transformed};
