use clap::{Parser, Subcommand};
use std::path::PathBuf;

use chapel::ai::GenClient;
use chapel::commands::{AiCommand, ComposeCommand, ConfigCommand, ContentCommand, SectionsCommand};
use chapel::config::Config;
use chapel::filestore::RemoteFileStore;
use chapel::store::RemoteStore;

#[derive(Parser)]
#[command(name = "chapel")]
#[command(version)]
#[command(about = "Admin CLI for the chapel content server", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage content collections (list, save, delete, watch, upload)
    Content(ContentCommand),

    /// Show the effective home-page section order
    Sections(SectionsCommand),

    /// Compose a photo under a decorative frame
    Compose(ComposeCommand),

    /// AI-assisted text (devotional, summaries, answers)
    Ai(AiCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config)?;

    match cli.command {
        Some(Commands::Content(cmd)) => {
            let store = RemoteStore::new(config.server_url.clone(), config.api_key.clone());
            let files = RemoteFileStore::new(config.server_url.clone(), config.api_key.clone());
            cmd.run(&store, &files).await?;
        }
        Some(Commands::Sections(cmd)) => {
            let store = RemoteStore::new(config.server_url.clone(), config.api_key.clone());
            cmd.run(&store).await?;
        }
        Some(Commands::Compose(cmd)) => {
            cmd.run()?;
        }
        Some(Commands::Ai(cmd)) => {
            let client = GenClient::new();
            cmd.run(&client).await?;
        }
        Some(Commands::Config(cmd)) => {
            cmd.run(&config)?;
        }
        None => {
            println!("Use --help to see available commands");
        }
    }

    Ok(())
}
