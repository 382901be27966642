//! One-shot command execution.

use crate::render::render_frame;
use crate::Commands;
use chainflow_core::{Catalog, Frame, SequencerState};
use colored::Colorize;

/// Executes a non-streaming command and returns the formatted output.
pub fn execute(catalog: &Catalog, cmd: Commands) -> Result<String, Box<dyn std::error::Error>> {
    match cmd {
        Commands::Repl | Commands::Play { .. } => unreachable!(),

        Commands::List => Ok(list(catalog)),

        Commands::Show { key, json } => {
            let scenario = catalog.require(&key)?;
            let frame = Frame::project(Some(&*scenario), &SequencerState::idle(Some(scenario.key)));
            if json {
                Ok(serde_json::to_string_pretty(&frame)?)
            } else {
                let mut output = format!("{}\n\n", scenario.key.label().bold());
                output.push_str(&render_frame(&frame));
                output.push_str("\n\nSteps:\n");
                for (k, step) in scenario.steps.iter().enumerate() {
                    output.push_str(&format!(
                        "  {}. {} [{}] {}\n",
                        k + 1,
                        chainflow_core::Scenario::edge_id_for_step(k).cyan(),
                        step.highlight.join(", ").green(),
                        step.description
                    ));
                }
                Ok(output)
            }
        }

        Commands::Export { output } => {
            let yaml = catalog.to_yaml()?;
            match output {
                Some(path) => {
                    std::fs::write(&path, yaml)?;
                    Ok(format!(
                        "{} {} scenario(s) to {}",
                        "Exported".green(),
                        catalog.len(),
                        path.display()
                    ))
                }
                None => Ok(yaml),
            }
        }
    }
}

/// Picker listing with checksums.
pub fn list(catalog: &Catalog) -> String {
    if catalog.is_empty() {
        return "No scenarios in catalog".yellow().to_string();
    }

    let mut output = String::new();
    for (i, scenario) in catalog.iter().enumerate() {
        output.push_str(&format!(
            "  {}. {:<10} {} ({} steps, checksum: {})\n",
            i + 1,
            scenario.key.as_str().cyan(),
            scenario.key.label(),
            scenario.step_count(),
            scenario.checksum
        ));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list() {
        colored::control::set_override(false);
        let output = list(&Catalog::builtin());
        assert_eq!(output.lines().count(), 5);
        assert!(output.contains("🔁 Ownership Transfer"));
    }

    #[test]
    fn test_show_unknown_scenario() {
        let result = execute(
            &Catalog::builtin(),
            Commands::Show {
                key: "xyz".to_string(),
                json: false,
            },
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_show_json() {
        let output = execute(
            &Catalog::builtin(),
            Commands::Show {
                key: "garage".to_string(),
                json: true,
            },
        )
        .unwrap();
        let value: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(value["scenario"], "garage");
        assert_eq!(value["step"], -1);
    }
}
