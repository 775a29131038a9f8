use anyhow::Result;
use log::{debug, trace};
use std::path::{Path, PathBuf};

use crate::{
    collaborators::{FileSystem, Tracer},
    config::CommonOption,
    pattern::matches_pattern,
    types::PathSet,
};

/// Picks where common files are written.
///
/// The first entry matching the pattern wins. Failing that, the pattern is
/// used verbatim when it names an existing path.
pub fn resolve_common_destination(
    files: &[PathBuf],
    option: &CommonOption,
    fs: &dyn FileSystem,
) -> Option<PathBuf> {
    let pattern = option.pattern()?;

    if let Some(carrier) = files.iter().find(|file| matches_pattern(file, pattern)) {
        debug!("Common files are carried by entry {}", carrier.display());
        return Some(carrier.clone());
    }

    let literal = PathBuf::from(pattern);
    if fs.exists(&literal) {
        debug!("Common files are written to {}", literal.display());
        return Some(literal);
    }

    debug!("Common option '{}' matched no entry and no existing path", pattern);
    None
}

/// Entries whose output will contain `path`.
///
/// Common files with a destination go only there. Anything else goes to each
/// entry that traces it, in entry order.
pub fn destinations_of(
    path: &Path,
    files: &[PathBuf],
    common: &PathSet,
    common_destination: Option<&Path>,
    tracer: &dyn Tracer,
) -> Result<Vec<PathBuf>> {
    if common.contains(path)
        && let Some(dest) = common_destination
    {
        trace!("{} is common, destination {}", path.display(), dest.display());
        return Ok(vec![dest.to_path_buf()]);
    }

    let mut destinations = Vec::new();
    for main in files {
        if tracer.trace_one(main)?.iter().any(|traced| traced.path == path) {
            trace!("{} is included by {}", path.display(), main.display());
            destinations.push(main.clone());
        }
    }
    debug!("{} has {} destinations", path.display(), destinations.len());
    Ok(destinations)
}
