//! Dataset indexing and sample resolution for the Stellar benchmark.
//!
//! This crate provides utilities for:
//! - Indexing identity folders into a flat (image, prompt) sample space
//! - Resolving sample metadata without decoding pixels
//! - Generating and caching foreground masks through a background remover
//! - Summarizing a dataset root

pub mod config;
pub mod dataset;
pub mod index;
pub mod mask;
pub mod types;
pub mod validation;

pub use config::{DatasetConfig, Layout, Split, DEFAULT_HELD_OUT_FROM};
pub use dataset::{Passthrough, SampleTransform, StellarDataset, StellarDatasetBuilder};
pub use index::SampleIndex;
pub use mask::{binarize_foreground, BackgroundRemover, CommandRemover, MaskCache};
pub use types::*;
pub use validation::{summarize, summarize_root};
