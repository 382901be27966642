//! chainflow - headless scenario player
//!
//! Plays the configured scenario (or every scenario with `--tour`) and logs
//! each frame as it is produced.

use chainflow_core::ScenarioKey;
use chainflow_player::{Config, FrameFilter, Sequencer};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "chainflow")]
#[command(about = "Headless player for chainflow scenario walkthroughs")]
#[command(version)]
struct Args {
    /// YAML config file
    #[arg(short, long, env = "CHAINFLOW_CONFIG")]
    config: Option<PathBuf>,

    /// Scenario to play (overrides player.default_scenario)
    #[arg(short, long)]
    scenario: Option<String>,

    /// Play every scenario in picker order
    #[arg(long)]
    tour: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();

    let config = match Config::load_with(args.config.clone()) {
        Ok(c) => {
            if let Some(path) = &args.config {
                tracing::info!("Loaded config from {}", path.display());
            }
            c
        }
        Err(e) => {
            tracing::error!("Failed to load config: {}", e);
            return Err(e.into());
        }
    };

    let timing = config.timing.to_timing();
    tracing::info!("Starting chainflow player");
    tracing::info!("  Step interval: {:?}", timing.step_interval);
    tracing::info!("  Start delay: {:?}", timing.start_delay);
    tracing::info!("  Terminal: {:?}", timing.terminal);
    match &config.catalog.path {
        Some(path) => tracing::info!("  Catalog: {}", path.display()),
        None => tracing::info!("  Catalog: built-in"),
    }

    let sequencer = Sequencer::from_config(&config)?;
    let mut frames = sequencer.subscribe(FrameFilter::default());
    tracing::debug!(
        "Frame log subscribed as {} ({} subscriber(s))",
        frames.id(),
        sequencer.broadcaster().subscription_count()
    );

    let queue: Vec<String> = if args.tour {
        ScenarioKey::ALL.iter().map(|k| k.to_string()).collect()
    } else {
        args.scenario
            .or(config.player.default_scenario.clone())
            .into_iter()
            .collect()
    };

    if queue.is_empty() {
        tracing::info!("No scenario selected, nothing to play");
        return Ok(());
    }

    'queue: for key in queue {
        let run = sequencer.select(&key)?;
        let deadline = tokio::time::Instant::now() + run.timeline.duration() + Duration::from_millis(50);

        loop {
            tokio::select! {
                frame = frames.recv() => match frame {
                    Ok(frame) => {
                        tracing::info!(
                            step = frame.step,
                            active_edge = ?frame.active_edge().map(|e| e.id.as_str()),
                            "{} {}",
                            frame.status_line(),
                            frame.description
                        );
                    }
                    Err(RecvError::Lagged(n)) => {
                        tracing::warn!("Renderer lagged by {} frame(s)", n);
                    }
                    Err(RecvError::Closed) => break 'queue,
                },
                _ = tokio::time::sleep_until(deadline) => break,
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received shutdown signal, stopping playback...");
                    sequencer.cancel();
                    break 'queue;
                }
            }
        }
    }

    sequencer.broadcaster().unsubscribe(frames.id());
    tracing::info!("Player stopped");
    Ok(())
}
