//! `StellarDataset`: sample resolution on top of a `SampleIndex`.

use crate::config::{DatasetConfig, Layout, Split};
use crate::index::SampleIndex;
use crate::mask::{BackgroundRemover, CommandRemover, MaskCache};
use crate::types::{
    DatasetResult, RawSample, SampleMetadata, StellarDatasetError, StellarSample,
};
use image::GenericImageView;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Turns a decoded sample into whatever the consumer batches.
pub trait SampleTransform: Send + Sync {
    type Output;

    fn apply(&self, sample: RawSample) -> DatasetResult<Self::Output>;
}

/// Hands the decoded image, mask and prompt through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct Passthrough;

impl SampleTransform for Passthrough {
    type Output = RawSample;

    fn apply(&self, sample: RawSample) -> DatasetResult<RawSample> {
        Ok(sample)
    }
}

pub struct StellarDatasetBuilder<T> {
    root: PathBuf,
    config: DatasetConfig,
    remover: Option<Arc<dyn BackgroundRemover>>,
    transform: T,
}

impl StellarDatasetBuilder<Passthrough> {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            config: DatasetConfig::default(),
            remover: None,
            transform: Passthrough,
        }
    }
}

impl<T: SampleTransform> StellarDatasetBuilder<T> {
    pub fn config(mut self, config: DatasetConfig) -> Self {
        self.config = config;
        self
    }

    pub fn layout(mut self, layout: Layout) -> Self {
        self.config.layout = layout;
        self
    }

    pub fn split(mut self, split: Split) -> Self {
        self.config.split = split;
        self
    }

    pub fn held_out_from(mut self, ordinal: u32) -> Self {
        self.config.held_out_from = ordinal;
        self
    }

    /// Defaults to `CommandRemover::default()` when not set.
    pub fn remover(mut self, remover: impl BackgroundRemover + 'static) -> Self {
        self.remover = Some(Arc::new(remover));
        self
    }

    pub fn shared_remover(mut self, remover: Arc<dyn BackgroundRemover>) -> Self {
        self.remover = Some(remover);
        self
    }

    pub fn transform<U: SampleTransform>(self, transform: U) -> StellarDatasetBuilder<U> {
        StellarDatasetBuilder {
            root: self.root,
            config: self.config,
            remover: self.remover,
            transform,
        }
    }

    pub fn build(self) -> DatasetResult<StellarDataset<T>> {
        let index = SampleIndex::build(&self.root, &self.config)?;
        let remover = self
            .remover
            .unwrap_or_else(|| Arc::new(CommandRemover::default()));
        Ok(StellarDataset {
            index,
            masks: MaskCache::new(remover),
            transform: self.transform,
        })
    }
}

#[derive(Debug)]
pub struct StellarDataset<T = Passthrough> {
    index: SampleIndex,
    masks: MaskCache,
    transform: T,
}

impl StellarDataset {
    pub fn builder(root: impl AsRef<Path>) -> StellarDatasetBuilder<Passthrough> {
        StellarDatasetBuilder::new(root)
    }
}

impl<T: SampleTransform> StellarDataset<T> {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn index(&self) -> &SampleIndex {
        &self.index
    }

    pub fn resolve_metadata(&self, index: usize) -> DatasetResult<SampleMetadata> {
        self.index.metadata(index)
    }

    /// Generate the mask of image `image_index` if it is not cached yet.
    pub fn ensure_mask(&self, image_index: usize) -> DatasetResult<PathBuf> {
        let len = self.index.images().len();
        let record = self
            .index
            .images()
            .get(image_index)
            .ok_or(StellarDatasetError::IndexOutOfRange {
                index: image_index,
                len,
            })?;
        self.masks.ensure_mask(&record.path)
    }

    pub fn resolve_sample(&self, index: usize) -> DatasetResult<StellarSample<T::Output>> {
        let location = self.index.locate(index)?;
        self.ensure_mask(location.image_index)?;
        self.read_sample(index)
    }

    /// Decode a sample whose mask is already on disk.
    pub fn read_sample(&self, index: usize) -> DatasetResult<StellarSample<T::Output>> {
        let location = self.index.locate(index)?;
        let record = self.index.image(&location);
        let decoded =
            image::open(&record.path).map_err(StellarDatasetError::image(&record.path))?;
        let (width, height) = decoded.dimensions();
        let mask = image::open(&record.mask_path)
            .map_err(StellarDatasetError::image(&record.mask_path))?;
        let raw = RawSample {
            image: decoded.to_rgb8(),
            mask,
            prompt: self.index.prompt(&location).prompt().to_string(),
        };
        Ok(StellarSample {
            sample: self.transform.apply(raw)?,
            orig_size: [height, width],
            index,
        })
    }
}
