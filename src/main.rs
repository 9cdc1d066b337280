//! CLI entry point for the overlap detection system.
//!
//! Provides commands for auditing a backlog, checking a new ticket against
//! it, and inspecting the vector store.

use anyhow::Context;
use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use scopesync::display::{THEME, create_help_text, create_progress_bar, with_spinner};
use scopesync::io::{CsvExporter, ExitCode, OutputFormat, OutputManager, ReportSink};
use scopesync::overlap::{ingest_new_item, populate_store};
use scopesync::vector::{FastEmbedGenerator, VectorError};
use scopesync::{
    ClusterAuditor, Corpus, EmbeddingGenerator, InMemoryVectorStore, JsonRecordSource,
    OverlapError, OverlapQuery, QueryInput, RecordSource, Settings, VectorStore, WorkItem,
    WorkItemRecord, logging,
};
use std::path::PathBuf;
use tracing::{info, warn};

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Semantic overlap detection for team backlogs
#[derive(Parser)]
#[command(
    name = "scopesync",
    version = env!("CARGO_PKG_VERSION"),
    about = "Find overlapping tickets across team backlogs",
    long_about = "Embed ticket summaries and flag semantically redundant work, either for one new ticket or across the whole backlog.",
    next_line_help = true,
    styles = clap_cargo_style(),
    after_help = create_help_text()
)]
struct Cli {
    /// Path to custom settings.toml file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
enum Commands {
    /// Initialize project
    #[command(about = "Set up .scopesync directory with default configuration")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show current configuration settings
    #[command(about = "Display active settings")]
    Config,

    /// Cluster the whole backlog
    #[command(
        about = "Batch audit: cluster every ticket and classify each overlap group",
        after_help = "Examples:\n  scopesync audit\n  scopesync audit --source backlog.jsonl --eps 0.4\n  scopesync audit --no-export --json"
    )]
    Audit {
        /// Work item file (overrides source.path)
        #[arg(long)]
        source: Option<PathBuf>,

        /// Neighbourhood radius in cosine distance (overrides clustering.eps)
        #[arg(long)]
        eps: Option<f32>,

        /// Smallest group reported (overrides clustering.min_cluster_size)
        #[arg(long)]
        min_cluster_size: Option<usize>,

        /// Skip writing the CSV reports
        #[arg(long)]
        no_export: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Check one new ticket against the backlog
    #[command(
        about = "Real-time query: find existing tickets similar to a new one",
        after_help = "Examples:\n  scopesync query \"Allow resetting password\" --team Nova\n  scopesync query \"Export invoices\" --team Atlas -k 5 --threshold 0.3\n  scopesync query \"SSO login\" --team Orion --id ORI-12 --ingest"
    )]
    Query {
        /// Summary of the new ticket
        summary: String,

        /// Team that owns the new ticket
        #[arg(long)]
        team: String,

        /// Id of the new ticket
        #[arg(long)]
        id: Option<String>,

        /// Description of the new ticket, stored on ingest
        #[arg(long)]
        description: Option<String>,

        /// Work item file (overrides source.path)
        #[arg(long)]
        source: Option<PathBuf>,

        /// Neighbours retrieved before thresholding (overrides query.k)
        #[arg(short)]
        k: Option<usize>,

        /// Maximum cosine distance (overrides query.max_distance_threshold)
        #[arg(long)]
        threshold: Option<f32>,

        /// Add the ticket to the vector store after reporting
        #[arg(long, requires = "id")]
        ingest: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// List the vector store contents
    #[command(about = "Show stored tickets, optionally only the given ids")]
    List {
        /// Ids to show (all when empty)
        ids: Vec<String>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },
}

impl Commands {
    fn output_format(&self) -> OutputFormat {
        match self {
            Commands::Audit { json, .. }
            | Commands::Query { json, .. }
            | Commands::List { json, .. } => OutputFormat::from_json_flag(*json),
            Commands::Init { .. } | Commands::Config => OutputFormat::Text,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    let format = cli.command.output_format();

    let code = match run(cli) {
        Ok(()) => ExitCode::Success,
        Err(err) => report_failure(&err, format),
    };
    std::process::exit(code.into());
}

fn report_failure(err: &anyhow::Error, format: OutputFormat) -> ExitCode {
    let Some(overlap) = err.downcast_ref::<OverlapError>() else {
        eprintln!("{}", THEME.error_with_icon(&format!("{err:#}")));
        return ExitCode::GeneralError;
    };

    if format.is_json() {
        return OutputManager::new(format)
            .error(overlap)
            .unwrap_or_else(|_| ExitCode::from_error(overlap));
    }

    eprintln!("{}", THEME.error_with_icon(&format!("{err:#}")));
    for suggestion in overlap.recovery_suggestions() {
        eprintln!("  Suggestion: {suggestion}");
    }
    ExitCode::from_error(overlap)
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => Settings::load()?,
    };
    if cli.debug {
        settings.debug = true;
    }
    logging::init(&settings);

    match cli.command {
        Commands::Init { force } => {
            let path = Settings::init_config_file(force)?;
            println!(
                "{}",
                THEME.success_with_icon(&format!(
                    "Created configuration file at: {}",
                    path.display()
                ))
            );
            println!("Edit this file to customize your settings.");
            Ok(())
        }

        Commands::Config => {
            println!("Current Configuration:");
            println!("{}", "=".repeat(50));
            let toml_str = toml::to_string_pretty(&settings).map_err(|e| OverlapError::Config {
                reason: e.to_string(),
            })?;
            println!("{toml_str}");
            Ok(())
        }

        Commands::Audit {
            source,
            eps,
            min_cluster_size,
            no_export,
            json,
        } => {
            if let Some(source) = source {
                settings.source.path = source;
            }
            if let Some(eps) = eps {
                settings.clustering.eps = eps;
            }
            if let Some(min_cluster_size) = min_cluster_size {
                settings.clustering.min_cluster_size = min_cluster_size;
            }
            settings.validate()?;
            configure_thread_pool(settings.clustering.parallel_threads);

            let format = OutputFormat::from_json_flag(json);
            let embedder = load_embedder(&settings, format)?;
            let corpus = build_corpus(&settings, &embedder, format)?;

            let auditor = ClusterAuditor::new(settings.clustering);
            let report = if format.is_json() {
                auditor.run(&corpus)?
            } else {
                with_spinner(
                    &format!("Clustering {} tickets...", corpus.len()),
                    || auditor.run(&corpus),
                )?
            };

            let mut output = OutputManager::new(format);
            output.audit(&report)?;

            if !no_export {
                let mut exporter = CsvExporter::from_config(&settings.report);
                exporter.audit(&report)?;
                output.info(&THEME.success_with_icon(&format!(
                    "Summary saved to {} (one row per group), assignments to {}",
                    exporter.summary_path().display(),
                    exporter.assignments_path().display()
                )))?;
            }
            Ok(())
        }

        Commands::Query {
            summary,
            team,
            id,
            description,
            source,
            k,
            threshold,
            ingest,
            json,
        } => {
            if let Some(source) = source {
                settings.source.path = source;
            }
            if let Some(k) = k {
                settings.query.k = k;
            }
            if let Some(threshold) = threshold {
                settings.query.max_distance_threshold = threshold;
            }
            settings.validate()?;
            configure_thread_pool(settings.clustering.parallel_threads);

            let format = OutputFormat::from_json_flag(json);
            let embedder = load_embedder(&settings, format)?;
            let corpus = build_corpus(&settings, &embedder, format)?;

            let store = if settings.store.enabled || ingest {
                open_store(&settings, embedder.model_id())?
            } else {
                None
            };
            if settings.store.enabled
                && let Some(store) = &store
            {
                populate_store(store, &corpus, settings.store.retry_policy())?;
            }

            let mut query = OverlapQuery::new(&corpus, settings.query)
                .with_embedder(&embedder, settings.embedding.retry_policy());
            if settings.store.enabled
                && let Some(store) = &store
            {
                query = query.with_store(
                    store,
                    settings.store.fallback_to_brute_force,
                    settings.store.retry_policy(),
                );
            }
            let finding = query.run(QueryInput::Text(&summary), &team)?;

            let ticket = id.clone().unwrap_or_else(|| "the new ticket".to_string());
            let mut output = OutputManager::new(format);
            output.query(&finding, &ticket)?;

            if ingest {
                let id = id.context("--ingest needs --id")?;
                let item = WorkItem::new(
                    WorkItemRecord {
                        id,
                        team,
                        summary,
                        description,
                    },
                    finding.query_embedding,
                );
                let target = store.as_ref().ok_or_else(|| OverlapError::StoreUnavailable {
                    reason: format!("cannot open {}", settings.store.path.display()),
                })?;
                ingest_new_item(&corpus, target, &item, settings.store.retry_policy())?;
                output.info(&THEME.success_with_icon("Ticket added to the vector store."))?;
            }

            if let Some(store) = &store {
                store.save(&settings.store.path).map_err(OverlapError::from)?;
                info!(path = %settings.store.path.display(), vectors = store.len(), "store saved");
            }
            Ok(())
        }

        Commands::List { ids, json } => {
            let store = InMemoryVectorStore::open(&settings.store.path, &settings.embedding.model)
                .map_err(OverlapError::from)?;
            let filter = (!ids.is_empty()).then_some(ids.as_slice());
            let records = store.get_all(filter).map_err(OverlapError::from)?;
            OutputManager::new(OutputFormat::from_json_flag(json)).records(&records)?;
            Ok(())
        }
    }
}

fn configure_thread_pool(threads: usize) {
    if threads == 0 {
        return;
    }
    if let Err(e) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        warn!(%e, "could not size the thread pool, using the default");
    }
}

fn load_embedder(settings: &Settings, format: OutputFormat) -> anyhow::Result<FastEmbedGenerator> {
    let config = &settings.embedding;
    let load = || {
        FastEmbedGenerator::new(
            &config.model,
            config.cache_dir.clone(),
            config.show_download_progress && !format.is_json(),
        )
    };
    let generator = if format.is_json() {
        load()
    } else {
        with_spinner(&format!("Loading embedding model {}...", config.model), load)
    };
    Ok(generator.map_err(OverlapError::from)?)
}

fn build_corpus(
    settings: &Settings,
    embedder: &dyn EmbeddingGenerator,
    format: OutputFormat,
) -> anyhow::Result<Corpus> {
    let records = JsonRecordSource::new(&settings.source.path).load()?;
    let teams = {
        let mut teams: Vec<&str> = records.iter().map(|r| r.team.as_str()).collect();
        teams.sort_unstable();
        teams.dedup();
        teams.len()
    };
    info!(records = records.len(), teams, "loaded work items");

    let batch_size = settings.embedding.batch_size;
    let retry = settings.embedding.retry_policy();
    let corpus = if format.is_json() {
        Corpus::from_records(records, embedder, batch_size, retry)?
    } else {
        let bar = create_progress_bar(records.len() as u64, "Embedding tickets");
        let corpus = Corpus::from_records_with_progress(records, embedder, batch_size, retry, |n| {
            bar.inc(n as u64)
        });
        bar.finish_and_clear();
        corpus?
    };
    Ok(corpus)
}

/// Opens the store snapshot. With fallback enabled an unreadable snapshot
/// is logged and skipped.
fn open_store(settings: &Settings, model_id: &str) -> anyhow::Result<Option<InMemoryVectorStore>> {
    let retry = settings.store.retry_policy();
    let opened = retry.run("vector store open", VectorError::is_transient, || {
        InMemoryVectorStore::open(&settings.store.path, model_id)
    });
    match opened {
        Ok(store) => Ok(Some(store)),
        Err(e) if settings.store.fallback_to_brute_force => {
            warn!(error = %e, "vector store unavailable, querying the corpus directly");
            Ok(None)
        }
        Err(e) => Err(OverlapError::StoreUnavailable {
            reason: e.to_string(),
        }
        .into()),
    }
}
