//! Dataset summaries for operators.

use crate::config::DatasetConfig;
use crate::index::SampleIndex;
use crate::mask::MaskCache;
use crate::types::{DatasetResult, DatasetSummary};
use std::path::Path;

pub fn summarize(index: &SampleIndex) -> DatasetSummary {
    DatasetSummary {
        root: index.root().to_path_buf(),
        identities: index.identities().len(),
        held_out_identities: index.identities().iter().filter(|i| i.held_out).count(),
        images: index.images().len(),
        prompts_per_image: index.prompts_per_image(),
        samples: index.len(),
        cached_masks: index
            .images()
            .iter()
            .filter(|img| MaskCache::is_cached(&img.path))
            .count(),
    }
}

pub fn summarize_root(root: &Path, config: &DatasetConfig) -> DatasetResult<DatasetSummary> {
    let index = SampleIndex::build(root, config)?;
    Ok(summarize(&index))
}
