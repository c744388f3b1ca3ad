use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use shelfmark::cli::commands;
use shelfmark::config::Config;
use shelfmark::recommend::Model;

#[derive(Parser)]
#[command(name = "shelfmark")]
#[command(about = "Shelfmark - Book Recommendation Service\nCollaborative, content-based and hybrid recommendations with per-session ratings")]
#[command(version)]
struct Cli {
  /// Path to a JSON configuration file
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand)]
enum Command {
  /// Start the REST server
  Serve {
    /// Address to bind, overriding the configuration
    #[arg(short, long)]
    bind: Option<SocketAddr>,
  },
  /// Recommend books similar to a title
  Recommend {
    /// Book title
    title: String,
    /// Similarity signal to use
    #[arg(short, long, value_enum, default_value_t = Model::Hybrid)]
    model: Model,
  },
  /// Show the most popular books
  Popular {
    /// Number of books to show
    #[arg(short, long)]
    limit: Option<usize>,
  },
  /// Create the ratings database schema
  InitDb,
  /// Create or update a rating on behalf of a session
  Rate {
    /// Session identifier
    session: String,
    /// Book title
    title: String,
    /// Integer rating
    #[arg(allow_hyphen_values = true)]
    rating: String,
  },
  /// List the ratings submitted by a session
  Ratings {
    /// Session identifier
    session: String,
  },
}

fn init_tracing(verbose: bool) {
  let default_filter =
    if verbose { "shelfmark=debug,tower_http=debug,info" } else { "shelfmark=info,tower_http=info,warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

  tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn handle(command: Command, mut config: Config) -> Result<()> {
  match command {
    Command::Serve { bind } => {
      if let Some(bind) = bind {
        config.bind = bind;
      }
      commands::serve(&config).await
    }
    Command::Recommend { title, model } => commands::recommend(&config, &title, model),
    Command::Popular { limit } => commands::popular(&config, limit),
    Command::InitDb => commands::init_db(&config),
    Command::Rate { session, title, rating } => commands::rate(&config, &session, &title, &rating),
    Command::Ratings { session } => commands::ratings(&config, &session),
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  let cli = Cli::parse();
  init_tracing(cli.verbose);

  let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;
  handle(cli.command, config).await
}
