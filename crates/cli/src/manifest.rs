//! Queue manifest loading (JSON or YAML)

use anyhow::{bail, Context, Result};
use arbitrator_core::domain::Queue;
use serde::Deserialize;
use std::path::Path;

/// `List` wrapper (`kind: List` / `QueueList`)
#[derive(Deserialize)]
struct QueueList {
    items: Vec<Queue>,
}

// Accepted document shapes: a sequence, an object with `items`, or a single
// Queue. The shape is chosen up front so field errors reach the user.
fn queues_from_json(value: serde_json::Value) -> Result<Vec<Queue>> {
    if value.is_array() {
        Ok(serde_json::from_value(value)?)
    } else if value.get("items").is_some() {
        Ok(serde_json::from_value::<QueueList>(value)?.items)
    } else {
        Ok(vec![serde_json::from_value(value)?])
    }
}

fn queues_from_yaml(value: serde_yaml::Value) -> Result<Vec<Queue>> {
    if value.is_sequence() {
        Ok(serde_yaml::from_value(value)?)
    } else if value.get("items").is_some() {
        Ok(serde_yaml::from_value::<QueueList>(value)?.items)
    } else {
        Ok(vec![serde_yaml::from_value(value)?])
    }
}

/// Load every Queue from the given manifest files
pub fn load_queues<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Queue>> {
    let mut queues = Vec::new();
    for path in paths {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest {}", path.display()))?;
        let loaded = parse_manifest(&content, is_json(path))
            .with_context(|| format!("Failed to parse manifest {}", path.display()))?;
        tracing::debug!(path = %path.display(), count = loaded.len(), "Loaded manifest");
        queues.extend(loaded);
    }
    Ok(queues)
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Parse one manifest body; YAML input may hold several `---` documents
pub fn parse_manifest(content: &str, json: bool) -> Result<Vec<Queue>> {
    let mut queues = Vec::new();

    if json {
        let value: serde_json::Value =
            serde_json::from_str(content).context("Invalid JSON manifest")?;
        queues.extend(queues_from_json(value).context("Invalid Queue manifest")?);
    } else {
        for document in serde_yaml::Deserializer::from_str(content) {
            let value = serde_yaml::Value::deserialize(document).context("Invalid YAML manifest")?;
            if value.is_null() {
                continue;
            }
            queues.extend(queues_from_yaml(value).context("Invalid Queue manifest")?);
        }
    }

    for queue in &queues {
        if !queue.type_meta.kind.is_empty() && queue.type_meta.kind != "Queue" {
            bail!(
                "Unexpected kind {:?} for {}/{}",
                queue.type_meta.kind,
                queue.namespace(),
                queue.name()
            );
        }
        if queue.name().is_empty() {
            bail!("Queue without metadata.name");
        }
    }

    Ok(queues)
}
