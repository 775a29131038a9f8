mod build;
mod config;
mod reporter;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use log::{debug, info};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use crate::config::Config;

#[derive(Parser)]
#[command(name = "oxibundle")]
#[command(about = "Bundle JavaScript/TypeScript entries with shared-file extraction", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Compile every entry into its own bundle
    Build {
        #[command(flatten)]
        config: Config,

        /// Output directory, relative paths are taken from the root
        #[arg(long, default_value = "dist")]
        out_dir: PathBuf,
    },
    /// Show how traced files are split between common and uncommon
    Partition(Config),
    /// List the bundles a file ends up in
    Destinations {
        #[command(flatten)]
        config: Config,

        /// File to look up
        #[arg(long)]
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    match cli.command {
        Commands::Build { mut config, out_dir } => {
            config.initialize()?;
            let root = config.root()?.clone();
            let bundle = config.bundle()?;

            let num_threads = rayon::current_num_threads();
            info!("Building {} entries (using {} threads)", bundle.files().len(), num_threads);

            let outputs = build::run_build(&bundle, &root, &root.join(out_dir))?;
            reporter::print_build_summary(&mut stdout, &outputs)?;

            writeln!(
                stdout,
                "\n{} Finished in {}ms on {} files (using {} threads).",
                "●".bright_blue(),
                start.elapsed().as_millis().to_string().cyan(),
                bundle.all().len().to_string().cyan(),
                num_threads.to_string().cyan()
            )?;
            stdout.flush()?;
        }
        Commands::Partition(mut config) => {
            config.initialize()?;
            let bundle = config.bundle()?;
            reporter::print_partition(&mut stdout, &bundle)?;

            writeln!(
                stdout,
                "{} Traced {} files in {}ms.",
                "●".bright_blue(),
                bundle.all().len().to_string().cyan(),
                start.elapsed().as_millis().to_string().cyan()
            )?;
            stdout.flush()?;
        }
        Commands::Destinations { mut config, file } => {
            config.initialize()?;
            let file = file
                .canonicalize()
                .with_context(|| format!("Failed to resolve {}", file.display()))?;
            let bundle = config.bundle()?;

            let destinations = bundle.destinations(&file)?;
            debug!("{} has {} destinations", file.display(), destinations.len());
            reporter::print_destinations(&mut stdout, &file, &destinations)?;
        }
    }

    Ok(())
}
