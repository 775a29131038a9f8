use anyhow::Result;
use log::{debug, trace};
use std::path::PathBuf;

use crate::{collaborators::Tracer, config::CommonOption, types::PathSet};

/// Result of splitting the traced graph of a set of entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    /// Every hit of the batch trace, duplicates included
    pub all: Vec<PathBuf>,
    /// Dependency closure of every file reached from more than one entry
    pub shared: PathSet,
    /// `shared` when extraction is enabled, empty otherwise
    pub common: PathSet,
    /// First-seen unique trace with `common` removed
    pub uncommon: PathSet,
}

/// Splits the dependency graph of `entries` into shared and per-entry files.
///
/// The batch trace is walked once to find files that occur more than once.
/// Each of those is then re-traced on its own and its whole closure, itself
/// included, is classified as shared.
pub fn partition(
    entries: &[PathBuf],
    tracer: &dyn Tracer,
    common: &CommonOption,
) -> Result<Partition> {
    debug!("Partitioning trace of {} entries", entries.len());
    let traced = tracer.trace(entries)?;
    trace!("Batch trace returned {} files", traced.len());

    let mut uniques = PathSet::new();
    let mut duplicates = PathSet::new();
    for file in &traced {
        if !uniques.insert(file.path.clone()) {
            trace!("Duplicate trace hit: {}", file.path.display());
            duplicates.insert(file.path.clone());
        }
    }
    debug!("Found {} unique and {} duplicated files", uniques.len(), duplicates.len());

    let mut shared = PathSet::new();
    for duplicate in &duplicates {
        for dependency in tracer.trace_one(duplicate)? {
            if shared.insert(dependency.path.clone()) {
                trace!("Shared via {}: {}", duplicate.display(), dependency.path.display());
            }
        }
    }

    let common = if common.is_enabled() { shared.clone() } else { PathSet::new() };
    let uncommon: PathSet = uniques.into_iter().filter(|p| !common.contains(p)).collect();
    debug!("Partitioned into {} common and {} uncommon files", common.len(), uncommon.len());

    Ok(Partition { all: traced.into_iter().map(|f| f.path).collect(), shared, common, uncommon })
}
