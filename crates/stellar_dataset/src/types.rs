//! Core types, error definitions, and data structures for stellar_dataset.

use data_contracts::AttributesRecord;
use image::{DynamicImage, RgbImage};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

pub type DatasetResult<T> = Result<T, StellarDatasetError>;

#[derive(Debug, Error)]
pub enum StellarDatasetError {
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json parse error at {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("image decode error at {path}: {source}")]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("structural mismatch at {path}: {msg}")]
    StructuralMismatch { path: PathBuf, msg: String },
    #[error("no dataset was found in {root}")]
    EmptyDataset { root: PathBuf },
    #[error("sample index {index} out of range for {len} samples")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("background removal failed for {path}: {source}")]
    BackgroundRemoval {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{0}")]
    Other(String),
}

impl StellarDatasetError {
    pub(crate) fn io(path: impl Into<PathBuf>) -> impl FnOnce(std::io::Error) -> Self {
        let path = path.into();
        move |source| StellarDatasetError::Io { path, source }
    }

    pub(crate) fn image(path: impl Into<PathBuf>) -> impl FnOnce(image::ImageError) -> Self {
        let path = path.into();
        move |source| StellarDatasetError::Image { path, source }
    }
}

/// A single prompt of an identity's prompt group, tagged with its provenance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptEntry {
    /// Always present; annotated with objects a generated image should show.
    Targeted {
        prompt: String,
        detectables: Vec<String>,
        categories: Vec<String>,
    },
    /// Only present for held-out identities; carries no annotations.
    HeldOut { prompt: String },
}

impl PromptEntry {
    pub fn prompt(&self) -> &str {
        match self {
            PromptEntry::Targeted { prompt, .. } | PromptEntry::HeldOut { prompt } => prompt,
        }
    }

    pub fn is_targeted(&self) -> bool {
        matches!(self, PromptEntry::Targeted { .. })
    }

    pub fn detectables(&self) -> &[String] {
        match self {
            PromptEntry::Targeted { detectables, .. } => detectables,
            PromptEntry::HeldOut { .. } => &[],
        }
    }

    pub fn categories(&self) -> &[String] {
        match self {
            PromptEntry::Targeted { categories, .. } => categories,
            PromptEntry::HeldOut { .. } => &[],
        }
    }
}

/// One identity folder as indexed.
#[derive(Debug, Clone)]
pub struct IdentityEntry {
    pub name: String,
    pub ordinal: u32,
    pub dir: PathBuf,
    pub held_out: bool,
    pub prompts: Vec<PromptEntry>,
    pub image_count: usize,
}

/// One source image with its sidecars.
#[derive(Debug, Clone)]
pub struct ImageRecord {
    pub path: PathBuf,
    /// Same-stem `_bg.png`; may not exist until the mask is generated.
    pub mask_path: PathBuf,
    pub attributes: AttributesRecord,
    /// Position of the owning identity in `SampleIndex::identities`.
    pub identity_slot: usize,
}

/// Where a linear sample index lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SampleLocation {
    pub index: usize,
    pub image_index: usize,
    pub prompt_index: usize,
}

/// Everything known about a sample without decoding pixels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleMetadata {
    pub index: usize,
    /// Local wall clock at resolution time (`YYYYMMDD_HHMMSS`).
    pub generation_datetime: String,
    pub prompt: String,
    /// Provenance flag; only reported for the targeted/held-out layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_stellar_t: Option<bool>,
    pub attributes: BTreeMap<String, i64>,
    pub detectables: Vec<String>,
    pub categories: Vec<String>,
    pub image_path: PathBuf,
    pub save_name: String,
}

/// Decoded sample handed to a `SampleTransform`.
#[derive(Debug, Clone)]
pub struct RawSample {
    pub image: RgbImage,
    pub mask: DynamicImage,
    pub prompt: String,
}

#[derive(Debug, Clone)]
pub struct StellarSample<T> {
    pub sample: T,
    /// Source image size as `[height, width]`.
    pub orig_size: [u32; 2],
    pub index: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DatasetSummary {
    pub root: PathBuf,
    pub identities: usize,
    pub held_out_identities: usize,
    pub images: usize,
    pub prompts_per_image: usize,
    pub samples: usize,
    pub cached_masks: usize,
}
