//! Doubt Resolution Agent entry point
//!
//! Serves the HTTP API, or runs the pipeline pieces from the command line.

use clap::{Parser, Subcommand};
use colored::Colorize;
use doubt_resolution::contracts::{IncomingQuestion, PredictRequest, RiskLevel};
use doubt_resolution::engine::{self, CannedCatalog};
use doubt_resolution::{create_router, AgentConfig, AppState, AGENT_ID, AGENT_VERSION};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "doubt-resolution")]
#[command(about = "Doubt Resolution Agent - exam-mode gated canned and generative answers")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, env = "PORT")]
        port: Option<u16>,

        /// Host to bind to
        #[arg(long, env = "HOST")]
        host: Option<String>,

        /// Canned answer catalog (YAML)
        #[arg(long, env = "DOUBT_CATALOG_PATH")]
        catalog: Option<PathBuf>,
    },

    /// Run one question through the full pipeline
    Ask {
        /// Question text
        #[arg(short, long)]
        question: String,

        /// Student id attached to the request
        #[arg(long, default_value = "cli")]
        student: String,

        /// Image attached to the question
        #[arg(long)]
        image_url: Option<String>,

        /// Output format (json or text)
        #[arg(short, long, default_value = "text")]
        output: String,
    },

    /// Show token-set scores against the canned catalog
    Match {
        /// Question text
        #[arg(short, long)]
        question: String,

        /// Canned answer catalog (YAML)
        #[arg(long, env = "DOUBT_CATALOG_PATH")]
        catalog: Option<PathBuf>,
    },

    /// Predict academic risk
    Predict {
        /// Attendance percentage
        #[arg(short, long)]
        attendance: f64,

        /// Marks percentage
        #[arg(short, long)]
        marks: f64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve {
            port,
            host,
            catalog,
        } => {
            let mut config = AgentConfig::from_env()?;
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(host) = host {
                config.host = host;
            }
            if catalog.is_some() {
                config.catalog_path = catalog;
            }

            let addr: SocketAddr = config.bind_address().parse()?;
            let state = Arc::new(AppState::from_config(&config)?);
            let router = create_router(state);

            tracing::info!("Starting Doubt Resolution Agent on {}", addr);
            tracing::info!("Agent ID: {}, Version: {}", AGENT_ID, AGENT_VERSION);

            let listener = tokio::net::TcpListener::bind(addr).await?;
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            tracing::info!("Server shut down");
        }

        Commands::Ask {
            question,
            student,
            image_url,
            output,
        } => {
            let config = AgentConfig::from_env()?;
            let state = AppState::from_config(&config)?;
            let mut incoming = IncomingQuestion::new(student, question);
            if let Some(url) = image_url {
                incoming = incoming.with_image(url);
            }
            let result = state.resolver.resolve(&incoming).await;

            match output.as_str() {
                "json" => {
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&serde_json::json!({
                            "answer": result.answer_text,
                            "citations": result.citations,
                            "path": result.path,
                            "match_score": result.match_score,
                        }))?
                    );
                }
                _ => {
                    let path = if result.path.is_error() {
                        result.path.to_string().red()
                    } else {
                        result.path.to_string().green()
                    };
                    println!("{} {}", "path:".bold(), path);
                    if let Some(score) = result.match_score {
                        println!("{} {}", "best score:".bold(), score);
                    }
                    println!();
                    println!("{}", result.answer_text);
                    if !result.citations.is_empty() {
                        println!();
                        println!("{} {}", "citations:".bold(), result.citations.join(", "));
                    }
                }
            }
        }

        Commands::Match { question, catalog } => {
            let catalog = CannedCatalog::load(catalog.as_deref())?;
            let normalized = question.trim().to_lowercase();

            if let Some(hit) = catalog.keyword_override(&normalized) {
                println!(
                    "{} keyword override '{}' would answer first",
                    "note:".yellow(),
                    hit.keyword
                );
            }

            for (key, score) in catalog.scores(&normalized) {
                let score_text = format!("{:>3}", score);
                let score_text = if score >= engine::DEFAULT_THRESHOLD {
                    score_text.green()
                } else {
                    score_text.normal()
                };
                println!("{}  {}", score_text, key);
            }
        }

        Commands::Predict { attendance, marks } => {
            let prediction = engine::predict(&PredictRequest { attendance, marks });
            let level = prediction.risk_level.to_string();
            let level = match prediction.risk_level {
                RiskLevel::High => level.red(),
                RiskLevel::Medium => level.yellow(),
                RiskLevel::Low => level.green(),
            };
            println!("{} {}", "risk:".bold(), level);
            println!("{} {:.2}", "predicted cgpa:".bold(), prediction.predicted_cgpa);
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
        tracing::info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                tracing::info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
