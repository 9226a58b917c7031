//! Copy per-subject prompt groups from a catalog into each identity folder.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use data_contracts::layout::{parse_identity_ordinal, PROMPT_FILE};
use data_contracts::PromptGroupFile;
use serde_json::Value;
use tracing::{debug, info};

use super::fs_ops::{ensure_dataset_dir, write_pretty_json};

pub const OBJECTS_FILE: &str = "objects.txt";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlacementReport {
    pub subjects: usize,
}

/// Write `{subject}/prompt.json` for every identity folder from the catalog
/// (a JSON object keyed by folder name) and copy the object list to the root.
///
/// Groups are rewritten as `prompts`, `detectables`, `categories`, in that order.
pub fn place_prompts(
    dataset_dir: &Path,
    catalog: &Path,
    objects: &Path,
) -> Result<PlacementReport> {
    ensure_dataset_dir(dataset_dir)?;
    let raw = fs::read(catalog).with_context(|| format!("read {}", catalog.display()))?;
    let groups: BTreeMap<String, Value> =
        serde_json::from_slice(&raw).with_context(|| format!("parse {}", catalog.display()))?;

    let mut report = PlacementReport::default();
    for entry in fs::read_dir(dataset_dir).context("read dataset dir")? {
        let entry = entry?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !path.is_dir() || parse_identity_ordinal(name).is_none() {
            continue;
        }
        let group = groups
            .get(name)
            .with_context(|| format!("no prompts for subject {name} in {}", catalog.display()))?;
        let parsed: PromptGroupFile = serde_json::from_value(group.clone())
            .with_context(|| format!("prompt group for subject {name}"))?;
        parsed
            .validate()
            .with_context(|| format!("prompt group for subject {name}"))?;
        write_pretty_json(&path.join(PROMPT_FILE), &parsed)?;
        debug!(subject = name, prompts = parsed.len(), "placed prompts");
        report.subjects += 1;
    }

    fs::copy(objects, dataset_dir.join(OBJECTS_FILE))
        .with_context(|| format!("copy {}", objects.display()))?;
    info!(subjects = report.subjects, "prompt placement complete");
    Ok(report)
}
