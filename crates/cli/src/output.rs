//! Rendering of queues for the terminal

use anyhow::Result;
use arbitrator_core::domain::Queue;
use clap::ValueEnum;
use std::sync::Arc;
use tabled::{Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

#[derive(Tabled)]
struct QueueRow {
    #[tabled(rename = "NAMESPACE")]
    namespace: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "WEIGHT")]
    weight: i32,
    #[tabled(rename = "LABELS")]
    labels: String,
}

impl From<&Queue> for QueueRow {
    fn from(queue: &Queue) -> Self {
        let labels = if queue.metadata.labels.is_empty() {
            "<none>".to_string()
        } else {
            queue
                .metadata
                .labels
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(",")
        };
        Self {
            namespace: queue.namespace().to_string(),
            name: queue.name().to_string(),
            weight: queue.spec.weight,
            labels,
        }
    }
}

/// Render a set of queues in the requested format
pub fn render(queues: &[Arc<Queue>], format: OutputFormat) -> Result<String> {
    let plain: Vec<&Queue> = queues.iter().map(|q| q.as_ref()).collect();
    Ok(match format {
        OutputFormat::Table => Table::new(plain.iter().map(|q| QueueRow::from(*q))).to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(&plain)?,
        OutputFormat::Yaml => serde_yaml::to_string(&plain)?,
    })
}

/// Render a single queue in the requested format
pub fn render_one(queue: &Queue, format: OutputFormat) -> Result<String> {
    Ok(match format {
        OutputFormat::Table => Table::new([QueueRow::from(queue)]).to_string(),
        OutputFormat::Json => serde_json::to_string_pretty(queue)?,
        OutputFormat::Yaml => serde_yaml::to_string(queue)?,
    })
}
