//! Event rendering

use anyhow::Result;
use fsobserve_core::{ChangeEvent, ChangeKind};
use owo_colors::OwoColorize;

/// Output format for events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Coloured, one event per line
    Text,
    /// One JSON object per line
    Json,
}

/// Render one event as a single line
pub fn render(event: &ChangeEvent, format: Format) -> Result<String> {
    match format {
        Format::Json => Ok(serde_json::to_string(event)?),
        Format::Text => Ok(render_text(event)),
    }
}

fn render_text(event: &ChangeEvent) -> String {
    let label = format!("{:<6}", event.kind().to_string());
    let label = match event.kind() {
        ChangeKind::Add => label.green().to_string(),
        ChangeKind::Update => label.yellow().to_string(),
        ChangeKind::Delete => label.red().to_string(),
    };

    let sizes = match (event.old_value(), event.object()) {
        (Some(old), Some(new)) => format!("{} -> {} bytes", old.size, new.size),
        (None, Some(new)) => format!("{} bytes", new.size),
        (Some(old), None) => format!("was {} bytes", old.size),
        (None, None) => String::new(),
    };

    format!("{} {} {}", label, event.name().display(), sizes.dimmed())
}
