use anyhow::{Context, Result};
use log::{debug, trace};
use sourcemap::SourceMap;
use std::path::{Path, PathBuf};

use crate::{
    bundle::Bundle,
    pattern::{expand_paths, matches_pattern},
    source_map::{CombinedSourceMap, line_count, to_comment},
    types::BundleEvent,
};

/// Concatenated output of a compile call, before rendering.
#[derive(Debug, Clone)]
pub struct Compiled {
    /// Code blocks joined by the joiner
    pub code: String,
    pub map: SourceMap,
    /// Line offset each file was registered at in `map`
    pub offsets: Vec<u32>,
    /// Files in emission order
    pub traced: Vec<PathBuf>,
    /// Entries that were bundled
    pub bundled: Vec<PathBuf>,
    joiner: String,
}

impl Compiled {
    /// Code, joiner, then the inline map comment.
    pub fn render(&self) -> Result<String> {
        Ok(format!("{}{}{}", self.code, self.joiner, to_comment(&self.map)?))
    }
}

impl Bundle {
    /// Compiles `paths` (all entries when `None`) into a single source with a
    /// trailing inline source map.
    pub fn compile(&self, paths: Option<&[PathBuf]>) -> Result<String> {
        self.compile_output(paths)?.render()
    }

    /// Like [`Bundle::compile`] but returns the unrendered parts.
    ///
    /// Paths that are not entries of this bundle are skipped silently. When a
    /// common destination exists, common files are left out of every entry and
    /// prepended once to entries matching the common pattern.
    pub fn compile_output(&self, paths: Option<&[PathBuf]>) -> Result<Compiled> {
        let requested = match paths {
            Some(paths) => self.requested_entries(paths)?,
            None => self.files.clone(),
        };
        let common = &self.partition.common;
        let extract = self.common_destination.is_some();
        let carrier = self.options.common.pattern();

        let mut traced = Vec::new();
        let mut bundled = Vec::new();
        for file in &requested {
            if !self.entries.contains(file) {
                trace!("Skipping {}: not an entry of this bundle", file.display());
                continue;
            }

            if let Some(pattern) = carrier
                && matches_pattern(file, pattern)
            {
                trace!("Prepending {} common files to {}", common.len(), file.display());
                traced.extend(common.iter().cloned());
            }

            for dependency in self.collaborators.tracer.trace_one(file)? {
                if extract && common.contains(&dependency.path) {
                    continue;
                }
                traced.push(dependency.path);
            }

            bundled.push(file.clone());
        }

        debug!("Compiling {} files for {} entries", traced.len(), bundled.len());
        self.assemble(traced, bundled)
    }

    /// Compiles only the common files, in their stored order.
    pub fn compile_common(&self) -> Result<String> {
        let traced: Vec<PathBuf> = self.partition.common.iter().cloned().collect();
        debug!("Compiling {} common files", traced.len());
        self.assemble(traced, Vec::new())?.render()
    }

    /// Transformed code of a single traced file, or an empty string when the
    /// file is not part of this bundle.
    pub fn compile_one(&self, path: &Path) -> Result<String> {
        if !self.traced.contains(path) {
            trace!("{} is not traced by this bundle", path.display());
            return Ok(String::new());
        }
        Ok(self.collaborators.files.file(path)?.transformed.code)
    }

    /// Entry paths are taken as they are, anything else goes through
    /// pattern expansion.
    fn requested_entries(&self, paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
        let mut requested = Vec::with_capacity(paths.len());
        for path in paths {
            if self.entries.contains(path) {
                requested.push(path.clone());
            } else {
                requested.extend(expand_paths(std::slice::from_ref(path))?);
            }
        }
        Ok(requested)
    }

    fn assemble(&self, traced: Vec<PathBuf>, bundled: Vec<PathBuf>) -> Result<Compiled> {
        let mut blocks = Vec::with_capacity(traced.len());
        let mut combined = CombinedSourceMap::new();
        let mut last_line = 0;

        for (index, path) in traced.iter().enumerate() {
            let record = self
                .collaborators
                .files
                .file(path)
                .with_context(|| format!("Failed to load {}", path.display()))?;
            let transformed = record.transformed;

            self.collaborators.events.emit(&BundleEvent::Compile {
                path,
                index,
                traced: &traced,
                bundled: &bundled,
            });

            combined.add_file(&transformed.map, last_line);
            last_line += line_count(&transformed.code);
            blocks.push(transformed.code);
        }

        let (map, offsets) = combined.finish();
        Ok(Compiled {
            code: blocks.join(&self.options.joiner),
            map,
            offsets,
            traced,
            bundled,
            joiner: self.options.joiner.clone(),
        })
    }
}
