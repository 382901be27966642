//! Terminal rendering of frames.

use chainflow_core::{EdgeStatus, Frame, NodeStatus, NodeView};
use colored::Colorize;

/// Full multi-line rendering: nodes, edges, footer.
pub fn render_frame(frame: &Frame) -> String {
    if frame.nodes.is_empty() {
        return format!("{}\n{}", "(empty canvas)".dimmed(), footer(frame));
    }

    let mut output = String::new();
    for node in &frame.nodes {
        output.push_str(&format!("  {}\n", node_box(node)));
    }
    output.push('\n');

    for edge in &frame.edges {
        let line = format!(
            "{} ──{}──▶ {}",
            edge.source,
            edge.label.trim(),
            edge.target
        );
        let line = match edge.status {
            EdgeStatus::Active => format!("» {}", line).green().bold().to_string(),
            EdgeStatus::Visited => format!("  {}", line).green().to_string(),
            EdgeStatus::Idle => format!("  {}", line).dimmed().to_string(),
        };
        output.push_str(&format!("  {} {}\n", edge.id.cyan(), line));
    }
    output.push('\n');
    output.push_str(&footer(frame));
    output
}

/// One-line rendering for streaming output.
pub fn render_compact(frame: &Frame) -> String {
    let mut line = frame.status_line().bold().to_string();
    if let Some(edge) = frame.active_edge() {
        let nodes: Vec<&str> = frame.active_nodes().map(|n| n.id.as_str()).collect();
        line.push_str(&format!(
            "  {} [{}]",
            edge.id.green().bold(),
            nodes.join(", ").green()
        ));
    } else if frame.nodes.is_empty() {
        line.push_str(&format!("  {}", "(empty canvas)".dimmed()));
    }
    if !frame.description.is_empty() {
        line.push_str(&format!("  {}", frame.description.italic()));
    }
    line
}

fn node_box(node: &NodeView) -> String {
    let text = format!("[{}] {}", node.id, node.label);
    match node.status {
        NodeStatus::Active => text.green().bold().to_string(),
        NodeStatus::Visited => text.green().to_string(),
        NodeStatus::Idle => text.normal().to_string(),
    }
}

fn footer(frame: &Frame) -> String {
    let mut footer = frame.status_line().bold().to_string();
    if !frame.description.is_empty() {
        footer.push('\n');
        footer.push_str(&frame.description.italic().to_string());
    }
    footer
}

#[cfg(test)]
mod tests {
    use super::*;
    use chainflow_core::{apply_step, Catalog, ScenarioKey, SequencerState};

    #[test]
    fn test_render_step() {
        colored::control::set_override(false);
        let mint = Catalog::builtin().get(ScenarioKey::Mint).unwrap();
        let state = apply_step(&SequencerState::idle(None), &mint, 0).unwrap();
        let frame = Frame::project(Some(&*mint), &state);

        let full = render_frame(&frame);
        assert!(full.contains("» n1 ──Mint Vehicle Tx──▶ n2"));
        assert!(full.contains("Step 1 / 3"));

        let compact = render_compact(&frame);
        assert!(compact.contains("e1 [n1, n2]"));
    }

    #[test]
    fn test_render_empty() {
        colored::control::set_override(false);
        let frame = Frame::empty(None);
        assert!(render_frame(&frame).contains("(empty canvas)"));
        assert!(render_compact(&frame).contains("Currently showing: —"));
    }
}
