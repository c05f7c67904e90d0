mod config;
mod document;
mod errors;
mod llm_client;
mod models;
mod pipeline;
mod routes;
mod state;
mod template;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::{build_http_client, Dispatcher, Provider};
use crate::pipeline::batch::{load_urls, BatchRunner, BatchSettings};
use crate::routes::build_router;
use crate::state::AppState;

/// Résumé extractor: turns PDF/DOCX résumés into structured JSON via an LLM
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Serve the upload form
    Serve,

    /// Download and extract a list of résumé URLs into a CSV report
    Batch {
        /// Résumé URLs to process
        urls: Vec<String>,

        /// File with one URL per line (blank lines and `#` comments skipped)
        #[arg(long)]
        urls_file: Option<PathBuf>,

        /// Backend to use: openai, gemini or ollama
        #[arg(long, default_value = "ollama")]
        provider: String,

        /// Path of the CSV report
        #[arg(long, default_value = "extraction_report.csv")]
        report: PathBuf,

        /// Directory for the per-résumé JSON files
        #[arg(long, default_value = "__BATCH_OUTPUTS__")]
        output_dir: PathBuf,

        /// Directory for temporary downloads
        #[arg(long, default_value = "temp_resumes_for_extraction")]
        download_dir: PathBuf,

        /// Number of résumés processed at once
        #[arg(long, default_value_t = 1)]
        concurrency: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Fails fast when no provider is configured at all
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting resume extractor v{}", env!("CARGO_PKG_VERSION"));

    let http = build_http_client()?;
    let dispatcher = Dispatcher::from_config(&config, http.clone());

    match cli.command {
        Command::Serve => serve(config, dispatcher).await,
        Command::Batch {
            mut urls,
            urls_file,
            provider,
            report,
            output_dir,
            download_dir,
            concurrency,
        } => {
            let provider: Provider = provider.parse()?;
            if let Some(path) = urls_file {
                urls.extend(load_urls(&path)?);
            }

            let settings = BatchSettings {
                provider,
                report_path: report,
                output_dir,
                download_dir,
                concurrency: concurrency.max(1),
            };
            let rows = BatchRunner::new(http, dispatcher, settings).run(&urls).await?;
            info!("Batch finished: {} row(s)", rows.len());
            Ok(())
        }
    }
}

async fn serve(config: Config, dispatcher: Dispatcher) -> Result<()> {
    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    let state = AppState { dispatcher, config };

    let app = build_router(state).layer(TraceLayer::new_for_http());

    info!("Listening on {addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
