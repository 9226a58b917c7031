use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Contents of `{stem}_attributes.json`, written once per image by the migration tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributesRecord {
    /// Coarse CelebA attributes (`-1` / `1` labels).
    pub attributes: BTreeMap<String, i64>,
    /// CelebA-Dialog fine-grained attribute levels.
    #[serde(default)]
    pub finegrained_attributes: BTreeMap<String, i64>,
    /// Identity id in the source dataset (not the Stellar folder ordinal).
    pub identity: u64,
    pub original_filename: String,
}
