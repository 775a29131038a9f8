use anyhow::Result;
use dashmap::DashMap;
use log::{debug, trace};
use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use oxibundle_core::{TracedFile, Tracer};

use crate::{constants::JS_TS_EXTENSIONS, parser::imports_for, resolver::Resolver, types::Specifier};

/// Traces import graphs by parsing JS/TS sources with oxc.
///
/// Each path is walked depth-first and emitted after its dependencies, so the
/// sequence is a valid concatenation order. A file appears at most once per
/// traced path. Back edges of import cycles are dropped.
pub struct ImportTracer {
    resolver: Resolver,
    import_cache: DashMap<PathBuf, Vec<Specifier>>,
    include_dynamic: bool,
}

impl ImportTracer {
    pub fn new(resolver: Resolver) -> Self {
        Self { resolver, import_cache: DashMap::new(), include_dynamic: true }
    }

    /// Whether `import()` targets are followed. Defaults to `true`.
    pub fn with_dynamic_imports(mut self, include: bool) -> Self {
        self.include_dynamic = include;
        self
    }

    /// Forgets what is known about `path` after it changed on disk.
    pub fn invalidate(&self, path: &Path) {
        debug!("Invalidating trace caches for {}", path.display());
        self.import_cache.remove(path);
        self.resolver.clear_cache();
    }

    fn dependencies(&self, file: &Path) -> Result<Vec<PathBuf>> {
        let parseable = file
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| JS_TS_EXTENSIONS.contains(&ext));
        if !parseable {
            trace!("Treating {} as a leaf", file.display());
            return Ok(Vec::new());
        }

        let mut deps = Vec::new();
        for spec in imports_for(file, &self.import_cache)? {
            if spec.is_dynamic() && !self.include_dynamic {
                trace!("Skipping dynamic import '{}' in {}", spec.request, file.display());
                continue;
            }
            if let Some(resolved) = self.resolver.resolve(file, &spec.request)
                && !deps.contains(&resolved)
            {
                deps.push(resolved);
            }
        }
        Ok(deps)
    }

    fn visit(
        &self,
        file: &Path,
        visiting: &mut HashSet<PathBuf>,
        done: &mut HashSet<PathBuf>,
        out: &mut Vec<TracedFile>,
    ) -> Result<()> {
        if done.contains(file) {
            return Ok(());
        }
        if !visiting.insert(file.to_path_buf()) {
            trace!("Cycle detected at: {}", file.display());
            return Ok(());
        }

        let deps = self.dependencies(file)?;
        for dep in &deps {
            self.visit(dep, visiting, done, out)?;
        }

        visiting.remove(file);
        done.insert(file.to_path_buf());
        out.push(TracedFile { path: file.to_path_buf(), dependencies: deps });
        Ok(())
    }
}

impl Tracer for ImportTracer {
    fn trace(&self, paths: &[PathBuf]) -> Result<Vec<TracedFile>> {
        let mut out = Vec::new();
        for path in paths {
            let before = out.len();
            self.visit(path, &mut HashSet::new(), &mut HashSet::new(), &mut out)?;
            trace!("Traced {} files from {}", out.len() - before, path.display());
        }
        debug!("Traced {} paths into {} files", paths.len(), out.len());
        Ok(out)
    }
}
