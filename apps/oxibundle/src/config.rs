use anyhow::{Result, anyhow};
use clap::Parser;
use glob::Pattern;
use log::{debug, info};
use std::{collections::HashMap, path::PathBuf};

use oxibundle_core::{Bundle, BundleOptions, CommonOption};
use oxibundle_trace::{
    DEFAULT_ENTRY_GLOB, collect_entries, disk_collaborators, find_bundle_config, find_git_root,
    read_tsconfig_paths,
};

#[derive(Debug, Clone, Parser)]
pub struct Config {
    /// Entry files or glob patterns relative to the root (defaults to --entry-glob matches)
    pub patterns: Vec<String>,

    /// Root directory of the project (defaults to git root)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Glob used to collect entry files when no patterns are given
    #[arg(long, default_value = DEFAULT_ENTRY_GLOB)]
    pub entry_glob: String,

    /// Extract files shared between entries: true, false, or a carrier pattern / output path
    #[arg(long)]
    pub common: Option<CommonOption>,

    /// Separator placed between concatenated files
    #[arg(long)]
    pub joiner: Option<String>,

    /// Bundle options file (defaults to oxibundle.json at the root)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[clap(skip)]
    pub tsconfig_paths: HashMap<String, Vec<String>>,
}

impl Config {
    /// Initialize the config by resolving the root directory and loading tsconfig paths
    pub fn initialize(&mut self) -> Result<()> {
        let root = if let Some(r) = self.root.take() {
            debug!("Using provided root directory: {:?}", r);
            r.canonicalize().unwrap_or(r)
        } else {
            debug!("No root provided, searching for git root");
            find_git_root()?.canonicalize()?
        };
        info!("Using root directory: {}", root.display());

        self.tsconfig_paths = read_tsconfig_paths(&root);
        debug!("Found {} tsconfig path aliases", self.tsconfig_paths.len());

        self.root = Some(root);
        Ok(())
    }

    /// Get the root directory, returning an error if not initialized
    pub fn root(&self) -> Result<&PathBuf> {
        self.root
            .as_ref()
            .ok_or_else(|| anyhow!("Config not initialized - call initialize() first"))
    }

    /// Options file values overridden by command line flags. Relative common
    /// patterns are anchored at the root.
    pub fn options(&self) -> Result<BundleOptions> {
        let root = self.root()?;
        let file = self.config.clone().or_else(|| find_bundle_config(root));
        let mut options = match file {
            Some(path) => BundleOptions::from_file(&path)?,
            None => BundleOptions::default(),
        };

        if let Some(common) = &self.common {
            options.common = common.clone();
        }
        if let Some(joiner) = &self.joiner {
            options.joiner = joiner.clone();
        }
        if let CommonOption::Pattern(pattern) = &options.common {
            options.common = CommonOption::Pattern(root.join(pattern).to_string_lossy().to_string());
        }

        debug!("Bundle options: {:?}", options);
        Ok(options)
    }

    /// Absolute entry patterns, either from the command line or collected
    /// with the entry glob. Collected paths are escaped so names such as
    /// `[id].js` are not read as globs.
    pub fn entry_patterns(&self) -> Result<Vec<String>> {
        let root = self.root()?;
        if self.patterns.is_empty() {
            let entries = collect_entries(root, &self.entry_glob)?;
            if entries.is_empty() {
                return Err(anyhow!("No entry files found under {}", root.display()));
            }
            return Ok(entries.iter().map(|p| Pattern::escape(&p.to_string_lossy())).collect());
        }
        Ok(self.patterns.iter().map(|p| root.join(p).to_string_lossy().to_string()).collect())
    }

    pub fn bundle(&self) -> Result<Bundle> {
        let root = self.root()?.clone();
        let collaborators = disk_collaborators(root, self.tsconfig_paths.clone());
        Bundle::new(collaborators, &self.entry_patterns()?, self.options()?)
    }
}
