//! jellysub - automated subtitle translation for Jellyfin libraries
//!
//! Scans the library on a fixed interval, translates one subtitle stream per
//! eligible item with ollama or gemini, and uploads the result back to the
//! server as a new subtitle track.

use anyhow::Result;
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, Level};
use tracing_appender::{non_blocking, non_blocking::WorkerGuard, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use jellysub::cli::{Args, Commands};
use jellysub::config::Config;
use jellysub::error::JellysubError;
use jellysub::pipeline::{translate_document, SubtitlePipeline};
use jellysub::poll::PollLoop;
use jellysub::pool::WorkerPool;
use jellysub::server::{JellyfinClient, MediaServer};
use jellysub::subtitle::SubtitleCodec;
use jellysub::translate::TranslatorFactory;
use jellysub::walker::LibraryWalker;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Load .env first so RUST_LOG from it reaches the log filter
    let dotenv_loaded = dotenv::dotenv().is_ok();

    // Setup logging to both console and file
    let _guard = setup_logging(args.verbose)?;
    if dotenv_loaded {
        info!("Loaded environment from .env");
    }

    match args.command {
        Commands::InitConfig { output } => {
            if output.exists() {
                return Err(JellysubError::Config(format!(
                    "{} already exists, not overwriting",
                    output.display()
                ))
                .into());
            }
            Config::default().save_to_file(&output)?;
            info!("Wrote default configuration to {}", output.display());
        }
        Commands::Translate { input, output, codec } => {
            let config = load_config(args.config.as_deref())?;
            config.validate_translate()?;
            translate_file(&config, &input, &output, codec.as_deref()).await?;
        }
        Commands::Run => {
            let config = load_config(args.config.as_deref())?;
            config.validate()?;
            run_service(&config, false).await?;
        }
        Commands::Scan => {
            let config = load_config(args.config.as_deref())?;
            config.validate()?;
            run_service(&config, true).await?;
        }
    }

    Ok(())
}

/// Load the configuration file and apply environment overrides
fn load_config(path: Option<&Path>) -> Result<Config> {
    let mut config = match path {
        Some(config_path) => Config::from_file(config_path)?,
        None => {
            // Try to load config.toml from current directory first
            if Path::new("config.toml").exists() {
                info!("Found config.toml in current directory, loading...");
                Config::from_file("config.toml")?
            } else {
                Config::default()
            }
        }
    };

    config.apply_env()?;
    Ok(config)
}

/// Scan the library once, or keep polling until Ctrl-C, then drain the pool
async fn run_service(config: &Config, once: bool) -> Result<()> {
    let server: Arc<dyn MediaServer> = Arc::new(JellyfinClient::connect(&config.server).await?);
    let translator = TranslatorFactory::create_translator(&config.translate)?;

    info!(
        "Starting jellysub: {} workers, target language {}, backend {} ({})",
        config.scan.max_workers,
        config.scan.target_language,
        translator.name(),
        config.translate.model()
    );

    let pipeline = Arc::new(SubtitlePipeline::from_config(config, server.clone(), translator));
    let pool = WorkerPool::new(pipeline, config.scan.max_workers, config.scan.queue_capacity);
    let poll = PollLoop::new(
        LibraryWalker::new(server),
        Duration::from_secs(config.scan.interval_secs),
    );

    if once {
        poll.run_cycle(&pool).await;
    } else {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Shutdown requested, no new scans will start");
                    let _ = shutdown_tx.send(true);
                }
                Err(e) => {
                    error!("Failed to listen for Ctrl-C: {}", e);
                    // Keep the sender alive so the loop is not stopped
                    std::future::pending::<()>().await;
                }
            }
        });
        poll.run(&pool, shutdown_rx).await;
    }

    info!("Waiting for {} queued or running job(s)", pool.in_flight());
    pool.shutdown().await;
    info!("jellysub stopped");
    Ok(())
}

/// Translate a local subtitle file without involving the media server
async fn translate_file(config: &Config, input: &Path, output: &Path, codec: Option<&str>) -> Result<()> {
    let codec = match codec {
        Some(tag) => SubtitleCodec::from_tag(tag)
            .ok_or_else(|| JellysubError::UnsupportedFormat(tag.to_string()))?,
        None => SubtitleCodec::from_path(input)?,
    };
    let translator = TranslatorFactory::create_translator(&config.translate)?;

    info!(
        "Translating {} [{}] with {} ({})",
        input.display(),
        codec,
        translator.name(),
        config.translate.model()
    );

    let bytes = tokio::fs::read(input).await?;
    let raw = String::from_utf8_lossy(&bytes);

    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({eta})")?
            .progress_chars("#>-"),
    );
    let progress = |done: usize, total: usize| {
        pb.set_length(total as u64);
        pb.set_position(done as u64);
    };

    let content = translate_document(
        codec,
        &raw,
        translator.as_ref(),
        config.translate.batch_size,
        config.subtitle.font_name.as_deref(),
        &progress,
    )
    .await?;
    pb.finish_with_message("done");

    tokio::fs::write(output, content).await?;
    info!("Wrote translated subtitles to {}", output.display());
    Ok(())
}

/// Setup logging to both console and file
fn setup_logging(verbose: bool) -> Result<WorkerGuard> {
    // Create log directory
    let log_dir = std::env::current_dir()?.join(".jellysub").join("log");
    std::fs::create_dir_all(&log_dir)?;

    // Set up file appender with daily rotation
    let file_appender = rolling::daily(&log_dir, "jellysub.log");
    let (non_blocking_file, guard) = non_blocking(file_appender);

    // Determine log level
    let log_level = if verbose { Level::DEBUG } else { Level::INFO };

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(true);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_ansi(false); // No ANSI colors in file

    let filter = EnvFilter::from_default_env().add_directive(log_level.into());
    let filter_description = filter.to_string();

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    info!(
        "Logging initialized - console: {}, file: {}",
        log_level,
        log_dir.join("jellysub.log").display()
    );
    debug!("Log filter: {}", filter_description);

    Ok(guard)
}
