//! chainflow-cli - Command-line interface for chainflow
//!
//! Provides a scenario picker REPL, streaming playback and catalog tools.

mod commands;
mod render;
mod repl;

use chainflow_core::Terminal;
use chainflow_player::{Config, FrameFilter, Sequencer};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chainflow-cli")]
#[command(about = "Scenario picker and terminal renderer for chainflow")]
#[command(version)]
struct Cli {
    /// YAML config file
    #[arg(short, long, env = "CHAINFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Catalog document (overrides catalog.path)
    #[arg(long, env = "CHAINFLOW_CATALOG")]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start interactive picker
    Repl,

    /// List scenarios in the catalog
    List,

    /// Show a scenario's base graph and steps
    Show {
        /// Scenario key or picker number
        key: String,

        /// Print the base frame as JSON
        #[arg(long)]
        json: bool,
    },

    /// Play a scenario and stream its frames
    Play {
        /// Scenario key or picker number
        key: String,

        /// Milliseconds between steps
        #[arg(short, long)]
        interval_ms: Option<u64>,

        /// Milliseconds before the first step
        #[arg(long)]
        start_delay_ms: Option<u64>,

        /// Stay on the final step instead of settling
        #[arg(long)]
        park: bool,

        /// Emit frames as JSON lines
        #[arg(long)]
        json: bool,

        /// Only emit frames with a highlighted step
        #[arg(long)]
        steps_only: bool,
    },

    /// Write the catalog as YAML
    Export {
        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let mut config = Config::load_with(cli.config.clone()).map_err(|e| {
        eprintln!("{}: {}", "Config error".red(), e);
        e
    })?;
    if let Some(path) = cli.catalog {
        config.catalog.path = Some(path);
    }

    let sequencer = Sequencer::from_config(&config).map_err(|e| {
        eprintln!("{}: {}", "Catalog error".red(), e);
        e
    })?;

    match cli.command {
        Some(Commands::Repl) | None => {
            repl::run(sequencer).await?;
        }
        Some(Commands::Play {
            key,
            interval_ms,
            start_delay_ms,
            park,
            json,
            steps_only,
        }) => {
            let mut timing = sequencer.timing();
            if let Some(ms) = interval_ms {
                timing = timing.with_step_interval(Duration::from_millis(ms.max(1)));
            }
            if let Some(ms) = start_delay_ms {
                timing = timing.with_start_delay(Duration::from_millis(ms));
            }
            if park {
                timing = timing.with_terminal(Terminal::Park);
            }

            // Subscribe BEFORE selecting so the reset frame is seen
            let mut frames = sequencer.subscribe(FrameFilter {
                steps_only,
                ..Default::default()
            });
            let run = sequencer.select_with(&key, timing)?;
            if run.scenario.is_none() {
                eprintln!("{}: unknown scenario '{}'", "Warning".yellow(), key);
            }
            let deadline =
                tokio::time::Instant::now() + run.timeline.duration() + Duration::from_millis(50);

            loop {
                tokio::select! {
                    frame = frames.recv() => match frame {
                        Ok(frame) => {
                            if json {
                                println!("{}", serde_json::to_string(&frame)?);
                            } else {
                                println!("{}", render::render_compact(&frame));
                            }
                        }
                        Err(RecvError::Lagged(n)) => {
                            eprintln!("{}: lagged {} frames", "Warning".yellow(), n);
                        }
                        Err(RecvError::Closed) => break,
                    },
                    _ = tokio::time::sleep_until(deadline) => break,
                    _ = tokio::signal::ctrl_c() => {
                        eprintln!("\n{}", "Stopping playback...".dimmed());
                        sequencer.cancel();
                        break;
                    }
                }
            }

            sequencer.broadcaster().unsubscribe(frames.id());
        }
        Some(cmd) => match commands::execute(sequencer.catalog(), cmd) {
            Ok(output) => println!("{}", output),
            Err(e) => {
                eprintln!("{}: {}", "Error".red(), e);
                std::process::exit(1);
            }
        },
    }

    Ok(())
}
