//! CLI entrypoint for litreview
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use litreview_application::{
    GenerateReviewUseCase, NoJournal, NoProgress, PipelineProgress, RunJournal,
};
use litreview_infrastructure::{
    ArxivSearch, ConfigLoader, FileArtifactWriter, FileConfig, JsonKnowledgeArchive,
    JsonlRunJournal, ModelEndpoint, OpenAiCompatibleExecutor,
};
use litreview_presentation::{
    Cli, ConsoleFormatter, OutputFormatter, ProgressReporter, SimpleProgress,
};
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

fn init_logging(verbose: u8, config: &FileConfig) -> Option<WorkerGuard> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(level));

    let (file, guard) = match &config.logging.dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "litreview.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry().with(console).with(file).init();
    guard
}

/// Command-line flags override file and environment settings.
fn apply_overrides(cli: &Cli, config: &mut FileConfig) {
    if let Some(model) = &cli.model {
        config.model.model = model.clone();
    }
    if let Some(base_url) = &cli.base_url {
        config.model.base_url = base_url.clone();
    }
    if !cli.categories.is_empty() {
        config.search.categories = cli.categories.clone();
    }
    if let Some(max_cycles) = cli.max_cycles {
        config.pipeline.max_revision_cycles = max_cycles;
    }
    if let Some(policy) = cli.on_exhaustion {
        config.pipeline.on_exhaustion = match policy {
            litreview_domain::ExhaustionPolicy::AcceptWithCaveats => "accept_with_caveats",
            litreview_domain::ExhaustionPolicy::FailQuality => "fail_quality",
        }
        .to_string();
    }
    if cli.skip_revision {
        config.pipeline.skip_revision = true;
    }
    if cli.persist_knowledge {
        config.knowledge.persist = true;
    }
    if let Some(dir) = &cli.output_dir {
        config.output.dir = dir.clone();
    }
    if cli.no_color {
        config.output.color = false;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_ref());
        return Ok(());
    }

    let mut config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref())
            .map_err(|e| anyhow!("Failed to load configuration: {}", e))?
    };
    apply_overrides(&cli, &mut config);

    let errors = config.validate();
    if !errors.is_empty() {
        for error in &errors {
            eprintln!("config error: {}", error);
        }
        bail!("invalid configuration ({} problem(s))", errors.len());
    }

    let log_guard = init_logging(cli.verbose, &config);
    if !config.output.color {
        colored::control::set_override(false);
    }

    let Some(topic) = cli.topic.clone() else {
        bail!("A topic is required.");
    };
    info!("Starting litreview for '{}'", topic);

    // === Dependency Injection ===
    let endpoint = ModelEndpoint::new(&config.model.base_url, &config.model.model)
        .with_api_key(config.model.resolve_api_key())
        .with_timeout(Duration::from_secs(config.model.timeout_seconds))
        .with_temperature(config.model.temperature);
    if endpoint.api_key.is_none() {
        warn!(
            "No API key found in ${}; sending unauthenticated requests",
            config.model.api_key_env
        );
    }
    let executor = Arc::new(OpenAiCompatibleExecutor::new(endpoint)?);
    let search = Arc::new(ArxivSearch::new()?);

    let journal: Arc<dyn RunJournal> = match &config.logging.dir {
        Some(dir) => match JsonlRunJournal::in_dir(dir) {
            Ok(journal) => {
                info!("Run journal: {}", journal.path().display());
                Arc::new(journal)
            }
            Err(e) => {
                warn!("Could not open run journal in {}: {}", dir.display(), e);
                Arc::new(NoJournal)
            }
        },
        None => Arc::new(NoJournal),
    };

    let cancellation = CancellationToken::new();
    {
        let token = cancellation.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nInterrupted, finishing the current step...");
                token.cancel();
            }
        });
    }

    let use_case = GenerateReviewUseCase::new(executor, search)
        .with_params(config.to_pipeline_params())
        .with_artifacts(Arc::new(FileArtifactWriter::new(config.output.dir.clone())))
        .with_archive(Arc::new(JsonKnowledgeArchive::new(config.knowledge.dir.clone())))
        .with_journal(journal)
        .with_cancellation(cancellation);

    let format = cli.output.or(config.output.format).unwrap_or_default();
    let progress: Box<dyn PipelineProgress> = if cli.quiet {
        Box::new(NoProgress)
    } else if std::io::stderr().is_terminal() {
        Box::new(ProgressReporter::new())
    } else if format != litreview_domain::OutputFormat::Json {
        Box::new(SimpleProgress)
    } else {
        Box::new(NoProgress)
    };

    let report = use_case
        .execute_with_progress(&topic, progress.as_ref())
        .await?;

    println!("{}", ConsoleFormatter.render(&report, format));
    if !cli.quiet {
        eprintln!("Artifacts written to {}", config.output.dir.display());
    }

    if !report.is_complete() {
        // exit skips destructors; flush the file log first
        drop(log_guard);
        std::process::exit(1);
    }
    Ok(())
}
