mod api;
mod config_cmd;
mod doctor_cmd;
mod runtime;
mod status_cmd;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use fetchbot_channels::{ChannelAdapter, ConsoleAdapter, WhatsAppAdapter};
use fetchbot_commands::{reply_for, Command, CommandRegistry};
use fetchbot_config::{config_dir, config_file_path, load_prepared, FetchbotConfig, ValidationReport};
use fetchbot_core::{DownloadKind, DownloadRequest};

#[derive(Parser)]
#[command(name = "fetchbot")]
#[command(about = "Chat-driven file and video downloader")]
#[command(version)]
struct Cli {
    /// Config file (defaults to $FETCHBOT_CONFIG, then ~/.fetchbot/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the WhatsApp webhook and the HTTP API
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Read commands from stdin and print replies
    Console,
    /// Download one URL and exit
    Fetch {
        #[arg(value_enum)]
        kind: KindArg,
        url: String,
    },
    /// Query a running server's health endpoint
    Status,
    /// Check config, download folder and video fetcher
    Doctor,
    /// Inspect or create the config file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective config with secrets masked
    Show,
    /// Print the config file location
    Path,
    /// Write a config file with default values
    Init {
        #[arg(long)]
        force: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    File,
    Video,
    App,
}

impl From<KindArg> for DownloadKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::File => DownloadKind::File,
            KindArg::Video => DownloadKind::Video,
            KindArg::App => DownloadKind::App,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let path = resolve_config_path(cli.config.as_deref());

    if let Commands::Config { action } = &cli.command {
        logging::init_logger(None, "warn");
        return match action {
            ConfigAction::Show => config_cmd::show(&path).await,
            ConfigAction::Path => {
                println!("{}", path.display());
                Ok(())
            }
            ConfigAction::Init { force } => config_cmd::init(&path, *force).await,
        };
    }

    let (config, report) = load_prepared(&path).await?;
    logging::init_logger(config.logging.dir.as_deref(), config.logging.level());
    report.log();

    match cli.command {
        Commands::Doctor => {
            if !doctor_cmd::run(&config, &report).await? {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Status => status_cmd::run(&config).await,
        Commands::Serve { port } => {
            require_valid(&report, &path)?;
            let mut config = config;
            if let Some(port) = port {
                config.server.port = Some(port);
            }
            run_server(config).await
        }
        Commands::Console => {
            require_valid(&report, &path)?;
            let router = runtime::command_router(&config)?;
            ConsoleAdapter::new(router).start().await
        }
        Commands::Fetch { kind, url } => {
            require_valid(&report, &path)?;
            run_fetch(&config, kind.into(), url).await
        }
        Commands::Config { .. } => Ok(()),
    }
}

fn require_valid(report: &ValidationReport, path: &Path) -> Result<()> {
    report
        .ensure_valid()
        .with_context(|| format!("Config file: {}", path.display()))
}

/// `--config`, then `FETCHBOT_CONFIG`, then the default location.
fn resolve_config_path(flag: Option<&Path>) -> PathBuf {
    if let Some(path) = flag {
        return path.to_path_buf();
    }
    match std::env::var("FETCHBOT_CONFIG") {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        _ => config_file_path(&config_dir()),
    }
}

async fn run_server(config: FetchbotConfig) -> Result<()> {
    let router = runtime::command_router(&config)?;

    let mut channel_routers = Vec::new();
    match runtime::whatsapp_settings(&config) {
        Some(settings) => {
            let adapter = WhatsAppAdapter::new(settings, router.clone())?;
            info!(path = %adapter.webhook_path(), "Registered WhatsApp channel adapter");
            channel_routers.push(adapter.build_router());
        }
        None => info!("No whatsapp section configured; webhook disabled"),
    }

    let app = api::build_router(channel_routers).layer(TraceLayer::new_for_http());
    let addr = format!("{}:{}", config.server.bind(), config.server.port());
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!(addr = %addr, "HTTP server listening");
    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_fetch(config: &FetchbotConfig, kind: DownloadKind, url: String) -> Result<()> {
    let service = runtime::download_service(config)?;
    let result = service.fetch(&DownloadRequest::new(url.clone(), kind)).await;

    let command = Command::for_kind(kind, url);
    println!("{}", reply_for(&command, Some(&result), &CommandRegistry::new()));

    if !result.is_success() {
        bail!(result.error_detail.unwrap_or_else(|| "download failed".to_string()));
    }
    Ok(())
}
