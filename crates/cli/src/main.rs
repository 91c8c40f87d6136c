//! RagChat CLI, the main entry point.
//!
//! Commands:
//! - `onboard`  Write a default config file
//! - `chat`     Interactive chat or single-question mode
//! - `services` List the discovered search services
//! - `models`   List the supported models
//! - `doctor`   Diagnose configuration and connectivity

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "ragchat",
    about = "RagChat: answers grounded in your documents",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Onboard,

    /// Ask questions about the indexed documents
    Chat {
        /// Ask a single question instead of entering interactive mode
        #[arg(short, long)]
        message: Option<String>,

        /// Model to answer with
        #[arg(long)]
        model: Option<String>,

        /// Search service to query (defaults to the first discovered)
        #[arg(short, long)]
        service: Option<String>,

        /// Don't use chat history for reformulation or answering
        #[arg(long)]
        no_history: bool,

        /// Number of recent messages used as chat history (1-10)
        #[arg(long)]
        history: Option<usize>,

        /// Number of context chunks to retrieve (1-10)
        #[arg(long)]
        chunks: Option<usize>,

        /// Print retrieved context and reformulated queries
        #[arg(long)]
        debug: bool,
    },

    /// List available search services
    Services,

    /// List supported models
    Models,

    /// Diagnose configuration and backend health
    Doctor,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    if cli.json_logs {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .init();
    }

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Chat {
            message,
            model,
            service,
            no_history,
            history,
            chunks,
            debug,
        } => {
            let options = commands::chat::ChatOptions {
                model,
                service,
                no_history,
                history,
                chunks,
                debug,
            };
            commands::chat::run(message, options).await?
        }
        Commands::Services => commands::services::run().await?,
        Commands::Models => commands::models::run().await?,
        Commands::Doctor => commands::doctor::run().await?,
    }

    Ok(())
}
