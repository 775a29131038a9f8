use anyhow::{Context, Result};
use log::{debug, info};
use rayon::prelude::*;
use std::{
    fs,
    path::{Path, PathBuf},
};

use oxibundle_core::Bundle;

/// One file written by a build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOutput {
    pub path: PathBuf,
    pub bytes: usize,
}

/// Location under `out_dir` mirroring `path`'s position under `root`.
/// Paths outside the root keep only their file name.
fn output_path(root: &Path, out_dir: &Path, path: &Path) -> PathBuf {
    match path.strip_prefix(root) {
        Ok(rel) => out_dir.join(rel),
        Err(_) => out_dir.join(path.file_name().unwrap_or(path.as_os_str())),
    }
}

fn write_output(target: PathBuf, code: &str) -> Result<BuildOutput> {
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&target, code).with_context(|| format!("Failed to write {}", target.display()))?;
    debug!("Wrote {} ({} bytes)", target.display(), code.len());
    Ok(BuildOutput { path: target, bytes: code.len() })
}

/// Compiles every entry into its own bundle under `out_dir`, in parallel.
///
/// When the common destination is a path that is not an entry, the common
/// chunk is written there as well.
pub fn run_build(bundle: &Bundle, root: &Path, out_dir: &Path) -> Result<Vec<BuildOutput>> {
    info!("Building {} entries into {}", bundle.files().len(), out_dir.display());

    let mut outputs = bundle
        .files()
        .par_iter()
        .map(|entry| {
            let code = bundle
                .compile(Some(std::slice::from_ref(entry)))
                .with_context(|| format!("Failed to bundle {}", entry.display()))?;
            write_output(output_path(root, out_dir, entry), &code)
        })
        .collect::<Result<Vec<_>>>()?;

    if let Some(dest) = bundle.common_destination()
        && !bundle.is_entry(dest)
    {
        let code = bundle.compile_common()?;
        outputs.push(write_output(output_path(root, out_dir, dest), &code)?);
    }

    Ok(outputs)
}
