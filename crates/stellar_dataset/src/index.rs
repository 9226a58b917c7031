//! Flat (identity, image, prompt) index over a Stellar dataset root.
//!
//! Samples are laid out image-major: sample `idx` uses image `idx / n` of the
//! flattened image list and prompt `idx % n` of that image's identity group,
//! where `n` is the uniform prompts-per-image count.

use crate::config::{DatasetConfig, Layout, Split};
use crate::types::{
    DatasetResult, IdentityEntry, ImageRecord, PromptEntry, SampleLocation, SampleMetadata,
    StellarDatasetError,
};
use data_contracts::layout::{
    attributes_path_for, is_attributes_file, is_source_image, mask_path_for,
    parse_identity_ordinal, HELD_OUT_PROMPT_FILE, PROMPT_FILE, TARGETED_PROMPT_FILE,
};
use data_contracts::{AttributesRecord, PromptGroupFile};
use serde::de::DeserializeOwned;
use std::fs;
use std::path::{Path, PathBuf};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct SampleIndex {
    root: PathBuf,
    layout: Layout,
    identities: Vec<IdentityEntry>,
    images: Vec<ImageRecord>,
    prompts_per_image: usize,
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> DatasetResult<T> {
    let raw = fs::read(path).map_err(StellarDatasetError::io(path))?;
    serde_json::from_slice(&raw).map_err(|e| StellarDatasetError::Json {
        path: path.to_path_buf(),
        source: e,
    })
}

fn structural(path: &Path, msg: impl Into<String>) -> StellarDatasetError {
    StellarDatasetError::StructuralMismatch {
        path: path.to_path_buf(),
        msg: msg.into(),
    }
}

/// Numerically named subdirectories, sorted by name as bytes ("10" before "2").
fn list_identity_dirs(root: &Path) -> DatasetResult<Vec<(String, u32, PathBuf)>> {
    let mut dirs = Vec::new();
    for entry in fs::read_dir(root).map_err(StellarDatasetError::io(root))? {
        let entry = entry.map_err(StellarDatasetError::io(root))?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
            continue;
        };
        let Some(ordinal) = parse_identity_ordinal(&name) else {
            continue;
        };
        dirs.push((name, ordinal, path));
    }
    dirs.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(dirs)
}

/// Images sorted by filename, each paired with its same-stem attributes record.
fn scan_identity_images(dir: &Path, slot: usize) -> DatasetResult<Vec<ImageRecord>> {
    let mut image_paths = Vec::new();
    let mut attribute_paths = Vec::new();
    for entry in fs::read_dir(dir).map_err(StellarDatasetError::io(dir))? {
        let entry = entry.map_err(StellarDatasetError::io(dir))?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        if is_source_image(&path) {
            image_paths.push(path);
        } else if is_attributes_file(&path) {
            attribute_paths.push(path);
        }
    }
    if image_paths.len() != attribute_paths.len() {
        return Err(structural(
            dir,
            format!(
                "{} images but {} attribute records",
                image_paths.len(),
                attribute_paths.len()
            ),
        ));
    }
    image_paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut records = Vec::with_capacity(image_paths.len());
    for path in image_paths {
        let attributes_path = attributes_path_for(&path);
        if !attribute_paths.contains(&attributes_path) {
            return Err(structural(
                &path,
                format!("no attribute record {}", attributes_path.display()),
            ));
        }
        let attributes: AttributesRecord = read_json(&attributes_path)?;
        records.push(ImageRecord {
            mask_path: mask_path_for(&path),
            path,
            attributes,
            identity_slot: slot,
        });
    }
    Ok(records)
}

fn targeted_entries(file: PromptGroupFile) -> Vec<PromptEntry> {
    let PromptGroupFile {
        prompts,
        detectables,
        categories,
    } = file;
    let mut detectables = detectables.unwrap_or_default().into_iter();
    let mut categories = categories.unwrap_or_default().into_iter();
    prompts
        .into_iter()
        .map(|prompt| PromptEntry::Targeted {
            prompt,
            detectables: detectables.next().unwrap_or_default(),
            categories: categories.next().unwrap_or_default(),
        })
        .collect()
}

fn load_group(path: &Path, annotated: Option<bool>) -> DatasetResult<PromptGroupFile> {
    let group: PromptGroupFile = read_json(path)?;
    let checked = match annotated {
        Some(require_categories) => group.validate_annotated(require_categories),
        None => group.validate(),
    };
    checked.map_err(|e| structural(path, e.to_string()))?;
    Ok(group)
}

/// Targeted prompts first, then held-out prompts for held-out identities.
fn load_prompt_group(
    dir: &Path,
    layout: Layout,
    held_out: bool,
) -> DatasetResult<Vec<PromptEntry>> {
    match layout {
        Layout::Simple => Ok(targeted_entries(load_group(
            &dir.join(PROMPT_FILE),
            Some(false),
        )?)),
        Layout::Targeted => {
            let mut entries =
                targeted_entries(load_group(&dir.join(TARGETED_PROMPT_FILE), Some(true))?);
            if held_out {
                let held = load_group(&dir.join(HELD_OUT_PROMPT_FILE), None)?;
                entries.extend(
                    held.prompts
                        .into_iter()
                        .map(|prompt| PromptEntry::HeldOut { prompt }),
                );
            }
            Ok(entries)
        }
    }
}

fn generation_timestamp() -> DatasetResult<String> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(format_description!(
        "[year][month][day]_[hour][minute][second]"
    ))
    .map_err(|e| StellarDatasetError::Other(format!("format timestamp: {e}")))
}

impl SampleIndex {
    /// Scan `root` and build the index.
    ///
    /// The first pass loads every selected identity; the second fixes the
    /// prompts-per-image count from the first identity and checks every other
    /// identity against it.
    pub fn build(root: impl AsRef<Path>, config: &DatasetConfig) -> DatasetResult<Self> {
        let root = root.as_ref().to_path_buf();

        let mut identities = Vec::new();
        let mut images = Vec::new();
        for (name, ordinal, dir) in list_identity_dirs(&root)? {
            if config.layout == Layout::Targeted {
                match config.split {
                    Split::Val if ordinal < config.held_out_from => continue,
                    Split::Test if ordinal >= config.held_out_from => break,
                    _ => {}
                }
            }
            let held_out = config.is_held_out(ordinal);
            let slot = identities.len();
            let records = scan_identity_images(&dir, slot)?;
            let prompts = load_prompt_group(&dir, config.layout, held_out)?;
            debug!(
                identity = %name,
                images = records.len(),
                prompts = prompts.len(),
                held_out,
                "indexed identity"
            );
            identities.push(IdentityEntry {
                name,
                ordinal,
                dir,
                held_out,
                prompts,
                image_count: records.len(),
            });
            images.extend(records);
        }

        let prompts_per_image = identities.first().map_or(0, |i| i.prompts.len());
        for identity in &identities {
            if identity.prompts.len() != prompts_per_image {
                return Err(structural(
                    &identity.dir,
                    format!(
                        "{} prompts but the dataset uses {} per image",
                        identity.prompts.len(),
                        prompts_per_image
                    ),
                ));
            }
        }

        if images.is_empty() || prompts_per_image == 0 {
            return Err(StellarDatasetError::EmptyDataset { root });
        }

        info!(
            root = %root.display(),
            layout = %config.layout,
            identities = identities.len(),
            images = images.len(),
            prompts_per_image,
            "built sample index"
        );
        Ok(SampleIndex {
            root,
            layout: config.layout,
            identities,
            images,
            prompts_per_image,
        })
    }

    pub fn len(&self) -> usize {
        self.images.len() * self.prompts_per_image
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn prompts_per_image(&self) -> usize {
        self.prompts_per_image
    }

    pub fn identities(&self) -> &[IdentityEntry] {
        &self.identities
    }

    pub fn images(&self) -> &[ImageRecord] {
        &self.images
    }

    pub fn locate(&self, index: usize) -> DatasetResult<SampleLocation> {
        let len = self.len();
        if index >= len {
            return Err(StellarDatasetError::IndexOutOfRange { index, len });
        }
        Ok(SampleLocation {
            index,
            image_index: index / self.prompts_per_image,
            prompt_index: index % self.prompts_per_image,
        })
    }

    pub fn image(&self, location: &SampleLocation) -> &ImageRecord {
        &self.images[location.image_index]
    }

    pub fn prompt(&self, location: &SampleLocation) -> &PromptEntry {
        let image = self.image(location);
        &self.identities[image.identity_slot].prompts[location.prompt_index]
    }

    /// `{parent relative to root, separators as "_"}-{stem}-{prompt index:02}`.
    pub fn save_name(&self, location: &SampleLocation) -> String {
        let path = &self.image(location).path;
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        let parent = rel
            .parent()
            .map(|p| {
                p.components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect::<Vec<_>>()
                    .join("_")
            })
            .unwrap_or_default();
        let stem = rel
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("{parent}-{stem}-{:02}", location.prompt_index)
    }

    pub fn metadata(&self, index: usize) -> DatasetResult<SampleMetadata> {
        let location = self.locate(index)?;
        let image = self.image(&location);
        let prompt = self.prompt(&location);
        Ok(SampleMetadata {
            index,
            generation_datetime: generation_timestamp()?,
            prompt: prompt.prompt().to_string(),
            is_stellar_t: (self.layout == Layout::Targeted).then(|| prompt.is_targeted()),
            attributes: image.attributes.attributes.clone(),
            detectables: prompt.detectables().to_vec(),
            categories: prompt.categories().to_vec(),
            image_path: image.path.clone(),
            save_name: self.save_name(&location),
        })
    }
}
