//! fsobserve CLI - print classified filesystem changes

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use watcher::Observer;

mod output;
mod settings;

use output::Format;

/// fsobserve - Watch directories and print add/update/delete events
#[derive(Parser)]
#[command(name = "fsobserve")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Paths to observe (a file observes its containing directory)
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Quiet period before an update is emitted, in milliseconds (default: 100)
    #[arg(long)]
    quiescence_ms: Option<u64>,

    /// Debounce recheck interval, in milliseconds (default: 10)
    #[arg(long)]
    poll_ms: Option<u64>,

    /// Additional gitignore-style pattern to ignore (repeatable)
    #[arg(long = "ignore", value_name = "GLOB")]
    ignore: Vec<String>,

    /// Report dotfiles too
    #[arg(long)]
    show_hidden: bool,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Debug logging (overridden by RUST_LOG)
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overrides(&self) -> settings::Overrides {
        settings::Overrides {
            quiescence_ms: self.quiescence_ms,
            poll_ms: self.poll_ms,
            ignore: self.ignore.clone(),
            show_hidden: self.show_hidden,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = settings::load(cli.config.as_deref())?;
    settings::apply(&mut config, &cli.overrides());

    let mut observer = Observer::new(config).context("Invalid observer configuration")?;
    for path in &cli.paths {
        observer.add(path);
    }

    let format = if cli.json { Format::Json } else { Format::Text };
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    {
        let (events, errors) = observer.streams();
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => println!("{}", output::render(&event, format)?),
                    None => break,
                },
                // Logged at warn by the observer; observation continues
                Some(_) = errors.recv() => {}
                _ = &mut ctrl_c => {
                    info!("Interrupted, shutting down");
                    break;
                }
            }
        }
    }

    let metrics = observer.metrics();
    observer.destroy();

    if metrics.errors > 0 {
        warn!("{} errors reported while observing", metrics.errors);
    }
    info!(
        "{} events from {} notifications ({} ignored)",
        metrics.events_emitted, metrics.notifications, metrics.ignored
    );

    Ok(())
}
