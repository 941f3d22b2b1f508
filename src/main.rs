use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use nugget_feed::config::Config;
use nugget_feed::run;

#[derive(Debug, Parser)]
#[command(name = "nugget-feed", version, about = "Daily article generator and RSS feed maintainer")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Produce today's article and write it to the hand-off file
    Generate {
        /// Use this topic instead of the daily rotation
        #[arg(long)]
        topic: Option<String>,
        /// Rotate as if it were this date (YYYY-MM-DD)
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Insert the hand-off article into the feed
    Update,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "nugget_feed=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    // Configuration errors abort before any work is done
    let config = Config::from_env()?;

    match cli.command {
        Command::Generate { topic, date } => {
            run::generate(&config, topic.as_deref(), date, Utc::now()).await?;
        }
        Command::Update => {
            run::update(&config, Utc::now())?;
        }
    }

    Ok(())
}
