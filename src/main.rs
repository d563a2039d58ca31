// src/main.rs

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use mobi_launcher::{LaunchEvent, LaunchRequest, LaunchService, LauncherConfig};

#[derive(Parser)]
#[command(name = "mobi-launcher")]
#[command(author, version, about = "Download and launch vanilla Minecraft releases", long_about = None)]
struct Cli {
    /// Data directory (default: platform data dir + MobiLauncher)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List versions from the catalog
    Versions {
        /// Only show release versions
        #[arg(long)]
        releases: bool,
    },
    /// Download a version's jar and libraries and print the classpath
    Resolve {
        version: String,
    },
    /// Print where a version's client jar can be downloaded by hand
    Url {
        version: String,
    },
    /// Look up the profile id registered for a player name
    Profile {
        username: String,
    },
    /// Make sure the Java runtime for a version is installed and verified
    Runtime {
        version: String,
    },
    /// Resolve, provision and start a version
    Launch {
        version: String,
        /// Player name (default: last used, or "Player")
        #[arg(short, long)]
        username: Option<String>,
        /// Password; without it the game starts offline
        #[arg(short, long)]
        password: Option<String>,
        /// Authentication endpoint (default: last used)
        #[arg(long)]
        api_url: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    mobi_launcher::init_tracing();

    let cli = Cli::parse();
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| LauncherConfig::default().data_dir);
    let config = LauncherConfig::load(&data_dir);
    let service = Arc::new(LaunchService::from_config(config.clone())?);

    match cli.command {
        Commands::Versions { releases } => {
            let versions = service.list_versions().await?;
            for entry in versions
                .iter()
                .filter(|entry| !releases || entry.version_type.as_deref() == Some("release"))
            {
                println!(
                    "{:<24} {:<10} {}",
                    entry.id,
                    entry.version_type.as_deref().unwrap_or("-"),
                    entry.release_time.as_deref().unwrap_or("")
                );
            }
        }
        Commands::Resolve { version } => {
            let resolved = service.resolve(&version).await?;
            info!(
                "{} resolved with {} classpath entries",
                resolved.version_id,
                resolved.entries.len()
            );
            println!("{}", resolved.joined());
        }
        Commands::Url { version } => {
            println!("{}", service.client_download_url(&version).await?);
        }
        Commands::Profile { username } => match service.player_id(&username).await {
            Some(id) => println!("{}", id),
            None => bail!("no profile found for {}", username),
        },
        Commands::Runtime { version } => {
            let runtime = service.ensure_runtime(&version).await?;
            println!("{}", runtime.java_bin.display());
        }
        Commands::Launch {
            version,
            username,
            password,
            api_url,
        } => {
            let mut config = config;
            let request = LaunchRequest {
                username: username.unwrap_or_else(|| config.preferences.username.clone()),
                password: password.unwrap_or_default(),
                api_url: api_url.unwrap_or_else(|| config.preferences.api_url.clone()),
                version_id: version,
            };

            config.preferences.username = request.username.clone();
            config.preferences.api_url = request.api_url.clone();
            config.preferences.version = request.version_id.clone();
            config.save().context("saving preferences")?;

            let mut events = service.spawn_launch(request);
            while let Some(event) = events.recv().await {
                match event {
                    LaunchEvent::Progress { stage, percent, .. } => {
                        eprintln!("[{:>3}%] {:?}", percent, stage);
                    }
                    LaunchEvent::Finished(outcome) => {
                        if outcome.is_launched() {
                            println!("{}", outcome.user_message());
                            return Ok(());
                        }
                        bail!("{}", outcome.user_message());
                    }
                }
            }
            bail!("launch task ended without reporting an outcome");
        }
    }

    Ok(())
}
