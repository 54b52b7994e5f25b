//! Taxonmerge CLI
//!
//! - `resolve`: load a configuration and a JSON taxon source, merge, and
//!   write the output taxa and a summary
//! - `check`: validate a configuration without loading any data
//! - `init`: write the default configuration as a starting point

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use taxonmerge_core::{IssueType, Summary, TaxonSource, Taxonomy, TaxonomyConfiguration};
use taxonmerge_storage::{persistence, DocumentIndex, MemoryIndex};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "taxonmerge")]
#[command(author, version, about = "Merge taxonomic name datasets into a single taxonomy")]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a taxon source against a configuration.
    Resolve {
        /// Taxonomy configuration JSON (defaults to the built-in configuration)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Taxon source JSON (locations and taxa)
        source: PathBuf,
        /// Output taxa JSON; stdout if absent
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Summary JSON
        #[arg(long)]
        summary: Option<PathBuf>,
        /// Write the issue and identifier documents as a JSON-lines snapshot
        #[arg(long)]
        index: Option<PathBuf>,
    },

    /// Validate a configuration.
    Check {
        config: PathBuf,
    },

    /// Write the default configuration.
    Init {
        #[arg(short, long)]
        out: Option<PathBuf>,
    },
}

fn log_filter(verbose: bool) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| if verbose { "debug".into() } else { "info".into() })
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tracing_subscriber::registry()
        .with(log_filter(cli.verbose))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    match cli.command {
        Commands::Resolve {
            config,
            source,
            out,
            summary,
            index,
        } => cmd_resolve(config.as_deref(), &source, out.as_deref(), summary.as_deref(), index.as_deref()),
        Commands::Check { config } => cmd_check(&config),
        Commands::Init { out } => cmd_init(out.as_deref()),
    }
}

fn load_config(path: Option<&Path>) -> Result<TaxonomyConfiguration> {
    match path {
        Some(path) => TaxonomyConfiguration::from_path(path)
            .with_context(|| format!("failed to read configuration {}", path.display())),
        None => Ok(TaxonomyConfiguration::default()),
    }
}

fn cmd_resolve(
    config: Option<&Path>,
    source: &Path,
    out: Option<&Path>,
    summary: Option<&Path>,
    index_path: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let source = TaxonSource::from_path(source)
        .with_context(|| format!("failed to read taxon source {}", source.display()))?;
    eprintln!(
        "{} {} taxa for {}",
        "Resolving".green().bold(),
        source.taxa.len(),
        config.id.bold()
    );

    let index = Arc::new(MemoryIndex::new());
    let mut taxonomy = Taxonomy::new(config, index.clone() as Arc<dyn DocumentIndex>)
        .context("failed to create taxonomy")?;
    taxonomy.load(&source).context("failed to load taxon source")?;
    let resolved = taxonomy.resolve();
    report_summary(&taxonomy.summary());
    if let Err(err) = resolved {
        tracing::error!(error = %err, "resolution failed");
        print_issues(&taxonomy, IssueType::Validation);
        return Err(anyhow!(err).context("resolution failed"));
    }

    let taxa = taxonomy.output_taxa();
    write_json(out, &taxa).context("failed to write output taxa")?;
    if let Some(path) = out {
        eprintln!("{} {} ({} taxa)", "wrote".green().bold(), path.display().to_string().bold(), taxa.len());
    }
    if let Some(path) = summary {
        write_json(Some(path), &taxonomy.summary()).context("failed to write summary")?;
        eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
    }
    if let Some(path) = index_path {
        index.commit()?;
        index.refresh()?;
        let documents = persistence::save_snapshot(&index, path)
            .with_context(|| format!("failed to write index snapshot {}", path.display()))?;
        eprintln!(
            "{} {} ({} documents)",
            "wrote".green().bold(),
            path.display().to_string().bold(),
            documents
        );
    }
    Ok(())
}

fn cmd_check(path: &Path) -> Result<()> {
    eprintln!("{} {}", "Validating".green().bold(), path.display());
    let config = load_config(Some(path))?;
    config.validate().context("invalid configuration")?;
    eprintln!(
        "{} {} providers, default {}, inference {}",
        "ok".green().bold(),
        config.providers.len(),
        config.default_provider,
        config.inference_provider_id()
    );
    Ok(())
}

fn cmd_init(out: Option<&Path>) -> Result<()> {
    write_json(out, &TaxonomyConfiguration::default()).context("failed to write configuration")?;
    if let Some(path) = out {
        eprintln!("{} {}", "wrote".green().bold(), path.display().to_string().bold());
    }
    Ok(())
}

fn write_json<T: Serialize + ?Sized>(path: Option<&Path>, value: &T) -> Result<()> {
    match path {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let mut writer = BufWriter::new(File::create(path)?);
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
        }
        None => {
            let stdout = io::stdout();
            let mut writer = stdout.lock();
            serde_json::to_writer_pretty(&mut writer, value)?;
            writer.write_all(b"\n")?;
        }
    }
    Ok(())
}

fn report_summary(summary: &Summary) {
    eprintln!(
        "{} instances {}, concepts {} (resolved {}, cleared {}), output taxa {}",
        "info:".yellow().bold(),
        summary.instances,
        summary.concepts,
        summary.resolved_concepts,
        summary.cleared_concepts,
        summary.output_taxa
    );
    for (kind, n) in summary.issues.iter().filter(|(_, n)| **n > 0) {
        let label = match kind.as_str() {
            "ERROR" | "VALIDATION" => kind.red().bold(),
            "PROBLEM" => kind.yellow().bold(),
            _ => kind.normal(),
        };
        eprintln!("  {label}: {n}");
    }
}

fn print_issues(taxonomy: &Taxonomy, kind: IssueType) {
    for issue in taxonomy.reporter().issues().iter().filter(|i| i.kind == kind) {
        eprintln!("  {} {} {}", kind.label().red(), issue.code.bold(), issue.message);
    }
}
