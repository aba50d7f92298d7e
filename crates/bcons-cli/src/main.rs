use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bcons")]
#[command(about = "bcons relay - routes remote debug messages into a console", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve which project a page URL belongs to
    Resolve {
        url: String,
    },
    /// Render a single wire message file to the terminal
    Show {
        /// JSON file holding one wire message
        file: PathBuf,
    },
    /// Replay a JSONL session of navigations, panel events and messages
    Replay {
        file: PathBuf,
        /// Prefix console lines with the time they were rendered
        #[arg(long)]
        timestamps: bool,
    },
    /// Fetch user data from the API and persist it
    Refresh {
        /// API token (defaults to the stored one)
        #[arg(long)]
        token: Option<String>,
    },
    /// Store the decrypt passphrase of a project on this device
    SetKey {
        project: String,
        passphrase: String,
    },
    /// Show the stored account and its projects
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let ctx = commands::AppContext::load(cli.config)?;
    bcons_execution::init_logging(&ctx.config.log_level)?;

    match cli.command {
        Commands::Resolve { url } => commands::resolve::run(&ctx, &url).await?,
        Commands::Show { file } => commands::show::run(&ctx, &file).await?,
        Commands::Replay { file, timestamps } => {
            commands::replay::run(&ctx, &file, timestamps).await?
        }
        Commands::Refresh { token } => commands::refresh::run(&ctx, token).await?,
        Commands::SetKey {
            project,
            passphrase,
        } => commands::set_key::run(&ctx, &project, &passphrase).await?,
        Commands::Status => commands::status::run(&ctx).await?,
    }

    Ok(())
}
