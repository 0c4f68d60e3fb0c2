//! SmartPick CLI — the main entry point.
//!
//! Commands:
//! - `onboard`  — Write the default config file
//! - `serve`    — Start the HTTP gateway
//! - `chat`     — Run one chat turn against the agent and print the frames
//! - `resolve`  — Match free text to a catalog card
//! - `rotate`   — Compute the carousel command for a card

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(
    name = "smartpick",
    about = "SmartPick — card recommendation chat backend",
    version,
    author
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the default configuration file
    Onboard,

    /// Start the HTTP gateway server
    Serve {
        /// Override the port
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Send one message through the chat backend and print the event frames
    Chat {
        /// The user message
        message: String,

        /// Continue an existing thread
        #[arg(short, long)]
        thread_id: Option<String>,
    },

    /// Resolve a card name or mention to its catalog id
    Resolve {
        /// Free text, e.g. "현대카드 Summit"
        name: String,
    },

    /// Compute the carousel rotation toward a card
    Rotate {
        /// Current cumulative carousel angle in degrees
        #[arg(short, long, allow_negative_numbers = true)]
        angle: f64,

        /// Catalog id of the card to bring to the front
        #[arg(short, long)]
        entity: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();

    match cli.command {
        Commands::Onboard => commands::onboard::run().await?,
        Commands::Serve { port } => commands::serve::run(port).await?,
        Commands::Chat { message, thread_id } => commands::chat::run(message, thread_id).await?,
        Commands::Resolve { name } => commands::resolve::run(&name)?,
        Commands::Rotate { angle, entity } => commands::rotate::run(angle, &entity)?,
    }

    Ok(())
}
