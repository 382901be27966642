//! Interactive scenario picker.

use crate::render::{render_compact, render_frame};
use chainflow_core::{ScenarioKey, Terminal, Timing};
use chainflow_player::{FrameFilter, Sequencer};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;

const HELP_TEXT: &str = r#"
Available commands:
  help                    Show this help
  list                    List scenarios

  <key> | <n>             Play a scenario (mint, garage, service, transfer, lookup or 1-5)
  select <key>            Play any key; unknown keys clear the canvas
  stop                    Cancel the current run
  status                  Draw the current frame

  interval <ms>           Set the step interval
  mode park|settle        Park on the last step or return to the base graph

  quit, exit              Exit the picker
"#;

pub async fn run(sequencer: Sequencer) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", "📊 Simulation Controls".bold().cyan());
    println!("{}", crate::commands::list(sequencer.catalog()));

    // Stream frames while the prompt is up
    let mut frames = sequencer.subscribe(FrameFilter::default());
    let subscription_id = frames.id().to_string();
    let printer = tokio::spawn(async move {
        loop {
            match frames.recv().await {
                Ok(frame) => println!("{}", render_compact(&frame)),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            }
        }
    });

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut rl: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    let history_path = std::env::var("HOME")
        .map(|h| std::path::PathBuf::from(h).join(".chainflow_history"))
        .unwrap_or_else(|_| ".chainflow_history".into());
    let _ = rl.load_history(&history_path);

    println!("Type 'help' for available commands.\n");

    let mut timing = sequencer.timing();
    loop {
        let prompt = format!("{} ", "chainflow>".cyan());
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                match execute_repl_command(&sequencer, &mut timing, line) {
                    Ok(Some(output)) => println!("{}\n", output),
                    Ok(None) => break, // Exit command
                    Err(e) => println!("{}: {}\n", "Error".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                sequencer.cancel();
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                println!("{}: {:?}", "Error".red(), err);
                break;
            }
        }
    }

    let _ = rl.save_history(&history_path);

    sequencer.cancel();
    sequencer.broadcaster().unsubscribe(&subscription_id);
    printer.abort();
    println!("{}", "Bye.".dimmed());

    Ok(())
}

fn execute_repl_command(
    sequencer: &Sequencer,
    timing: &mut Timing,
    line: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.is_empty() {
        return Ok(Some(String::new()));
    }

    let cmd = parts[0].to_lowercase();
    let args = &parts[1..];

    match cmd.as_str() {
        "help" | "?" => Ok(Some(HELP_TEXT.to_string())),

        "quit" | "exit" | "q" => Ok(None),

        "list" | "ls" => Ok(Some(crate::commands::list(sequencer.catalog()))),

        "select" | "s" => {
            let Some(key) = args.first() else {
                return Ok(Some("Usage: select <key>".to_string()));
            };
            play(sequencer, timing, key)
        }

        "stop" => {
            sequencer.cancel();
            Ok(Some("Stopped".yellow().to_string()))
        }

        "status" => Ok(Some(render_frame(&sequencer.frame()))),

        "interval" => {
            let Some(ms) = args.first() else {
                return Ok(Some(format!(
                    "Step interval: {}ms",
                    timing.step_interval.as_millis()
                )));
            };
            let ms: u64 = ms.parse()?;
            if ms == 0 {
                return Ok(Some("Interval must be greater than zero".yellow().to_string()));
            }
            *timing = timing.with_step_interval(Duration::from_millis(ms));
            Ok(Some(format!("Step interval set to {}ms", ms)))
        }

        "mode" => match args.first().map(|s| s.to_lowercase()).as_deref() {
            Some("park") => {
                *timing = timing.with_terminal(Terminal::Park);
                Ok(Some("Runs park on the final step".to_string()))
            }
            Some("settle") => {
                let delay = match sequencer.timing().terminal {
                    Terminal::Settle { delay } => delay,
                    Terminal::Park => Duration::from_millis(1000),
                };
                *timing = timing.with_terminal(Terminal::Settle { delay });
                Ok(Some(format!(
                    "Runs settle {}ms after the final step",
                    delay.as_millis()
                )))
            }
            _ => Ok(Some("Usage: mode park|settle".to_string())),
        },

        _ if ScenarioKey::from_picker(&cmd).is_some() => play(sequencer, timing, &cmd),

        _ => Ok(Some(format!(
            "Unknown command: {}. Type 'help' for help.",
            cmd
        ))),
    }
}

fn play(
    sequencer: &Sequencer,
    timing: &Timing,
    key: &str,
) -> Result<Option<String>, Box<dyn std::error::Error>> {
    let run = sequencer.select_with(key, *timing)?;
    Ok(Some(match run.scenario {
        Some(key) => format!(
            "{} {} ({} steps)",
            "Playing".green(),
            key.label(),
            run.timeline.step_count()
        ),
        None => format!("{} '{}', canvas cleared", "Unknown scenario".yellow(), key),
    }))
}
