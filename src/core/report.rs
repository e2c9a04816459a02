use crate::domain::model::{CensusOutcome, ImageInventory};
use crate::utils::error::Result;
use serde::{Deserialize, Serialize};
use std::fmt::Write;
use std::io;

pub const NO_SERVICES_MESSAGE: &str = "No services found.";
pub const NO_TASKS_MESSAGE: &str = "No tasks found.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Text,
    Json,
}

pub fn render(inventory: &ImageInventory, format: ReportFormat) -> Result<String> {
    match format {
        ReportFormat::Text => Ok(render_text(inventory)),
        ReportFormat::Json => render_json(inventory),
    }
}

/// Human-readable report, images sorted by URI.
pub fn render_text(inventory: &ImageInventory) -> String {
    let mut out = String::from("\nUnique container image URIs and services using them:\n");

    for (image, services) in inventory.images.iter() {
        let _ = writeln!(out, "{}", image);
        if services.is_empty() {
            out.push_str("  No active services using this image\n");
        } else {
            out.push_str("  Services:\n");
            for service in services {
                let _ = writeln!(out, "    - {}", service);
            }
        }
        out.push('\n');
    }

    out
}

pub fn render_json(inventory: &ImageInventory) -> Result<String> {
    Ok(serde_json::to_string_pretty(inventory)?)
}

/// Writes whatever the census produced. In JSON mode the early exits come
/// out as an empty inventory so the output always parses. Write failures
/// (closed pipe, full disk) surface as [`CensusError::IoError`].
///
/// [`CensusError::IoError`]: crate::utils::error::CensusError::IoError
pub fn write_outcome<W: io::Write>(
    out: &mut W,
    cluster: &str,
    outcome: &CensusOutcome,
    format: ReportFormat,
) -> Result<()> {
    let rendered = match (outcome, format) {
        (CensusOutcome::Inventory(inventory), ReportFormat::Text) => render_text(inventory),
        (CensusOutcome::Inventory(inventory), ReportFormat::Json) => {
            render_json(inventory)? + "\n"
        }
        (CensusOutcome::NoServices, ReportFormat::Text) => format!("{}\n", NO_SERVICES_MESSAGE),
        (CensusOutcome::NoTasks, ReportFormat::Text) => format!("{}\n", NO_TASKS_MESSAGE),
        (_, ReportFormat::Json) => render_json(&ImageInventory::empty(cluster))? + "\n",
    };

    out.write_all(rendered.as_bytes())?;
    out.flush()?;
    Ok(())
}
