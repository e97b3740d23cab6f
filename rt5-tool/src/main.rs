use clap::{Parser, Subcommand};
use tracing::Level;

mod commands;

use commands::{download::DownloadArgs, extract::ExtractArgs, sounds::SoundsArgs};

#[derive(Parser)]
#[command(
    name = "rt5",
    about = "Extractor and downloader for RuneTek5 game caches",
    version,
    author,
    long_about = "A command-line tool for working with RuneTek5 game caches: extracting files \
                  from a local chunked cache, downloading them from a content server over the \
                  JS5 protocol, and post-processing extracted soundtracks."
)]
struct Cli {
    /// Set the logging level
    #[arg(short, long, value_enum, default_value = "info")]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Extract files from a local game cache
    Extract(ExtractArgs),

    /// Download files from a content server
    Download(DownloadArgs),

    /// Join extracted soundtrack chunks into complete tracks
    CombineSounds(SoundsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(Level::from(cli.log_level))
        .with_target(false)
        .init();

    match cli.command {
        Commands::Extract(args) => commands::extract::run(args).await?,
        Commands::Download(args) => commands::download::run(args).await?,
        Commands::CombineSounds(args) => commands::sounds::run(args)?,
    }

    Ok(())
}
