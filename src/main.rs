//! Card Session - Main Server
//!
//! OAuth login and session enforcement for the card search API.

use anyhow::Result;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use card_session::{Config, MIN_COOKIE_SECRET_BYTES};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "card-session")]
#[command(about = "Card search API session server")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// Port to listen on (overrides config.yaml and SERVER_PORT)
        #[arg(short, long)]
        port: Option<u16>,

        /// Path to the YAML config file
        #[arg(short, long, env = "CONFIG_PATH")]
        config: Option<PathBuf>,
    },

    /// Print a fresh base64 cookie secret for `session.cookie_secret`
    GenSecret,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,card_session=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { port, config } => {
            let mut config = Config::from_yaml_and_env(config.as_deref())?;
            if let Some(port) = port {
                config.server_port = port;
            }
            card_session::start_server(config).await
        }
        Commands::GenSecret => {
            let bytes: [u8; MIN_COOKIE_SECRET_BYTES] = rand::random();
            println!("{}", STANDARD.encode(bytes));
            Ok(())
        }
    }
}
