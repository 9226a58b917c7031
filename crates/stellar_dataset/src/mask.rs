//! Foreground masks cached next to each image as `{stem}_bg.png`.
//!
//! A mask is generated at most once: when the file exists it is trusted as-is.
//! Two callers generating the same missing mask at the same time both run the
//! remover and the last write wins; `MaskCache::ensure_mask` is the only writer,
//! so a lock can be added there without touching sample reads.

use crate::types::{DatasetResult, StellarDatasetError};
use data_contracts::layout::mask_path_for;
use image::{DynamicImage, GenericImageView, ImageFormat, Rgb, RgbImage};
use std::fs;
use std::io::{self, Cursor, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Background removal: encoded image bytes in, encoded image with an alpha
/// channel marking the foreground out.
pub trait BackgroundRemover: Send + Sync {
    fn remove(&self, image_bytes: &[u8]) -> io::Result<Vec<u8>>;
}

impl<F> BackgroundRemover for F
where
    F: Fn(&[u8]) -> io::Result<Vec<u8>> + Send + Sync,
{
    fn remove(&self, image_bytes: &[u8]) -> io::Result<Vec<u8>> {
        self(image_bytes)
    }
}

/// Runs an external tool that reads an image on stdin and writes the cut-out on stdout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRemover {
    pub program: String,
    pub args: Vec<String>,
}

impl Default for CommandRemover {
    fn default() -> Self {
        Self {
            program: "rembg".to_string(),
            args: vec!["i".into(), "-".into(), "-".into()],
        }
    }
}

impl CommandRemover {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }
}

impl BackgroundRemover for CommandRemover {
    fn remove(&self, image_bytes: &[u8]) -> io::Result<Vec<u8>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| io::Error::other("child stdin unavailable"))?;
        // Feed stdin from a separate thread so a full stdout pipe cannot deadlock us.
        let input = image_bytes.to_vec();
        let writer = std::thread::spawn(move || stdin.write_all(&input));
        let output = child.wait_with_output()?;
        let written = writer
            .join()
            .map_err(|_| io::Error::other("stdin writer panicked"))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(io::Error::other(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        written?;
        Ok(output.stdout)
    }
}

/// Binary foreground mask from the last channel (alpha when present): non-zero
/// becomes 255, broadcast to three channels.
pub fn binarize_foreground(img: &DynamicImage) -> RgbImage {
    let (width, height) = img.dimensions();
    let color = img.color();
    let last_channel: Vec<u8> = if color.has_alpha() {
        img.to_rgba8().pixels().map(|p| p[3]).collect()
    } else if color.channel_count() == 1 {
        img.to_luma8().into_raw()
    } else {
        img.to_rgb8().pixels().map(|p| p[2]).collect()
    };
    RgbImage::from_fn(width, height, |x, y| {
        let v = if last_channel[(y * width + x) as usize] != 0 {
            255
        } else {
            0
        };
        Rgb([v, v, v])
    })
}

#[derive(Clone)]
pub struct MaskCache {
    remover: Arc<dyn BackgroundRemover>,
}

impl std::fmt::Debug for MaskCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaskCache").finish_non_exhaustive()
    }
}

impl MaskCache {
    pub fn new(remover: Arc<dyn BackgroundRemover>) -> Self {
        Self { remover }
    }

    pub fn is_cached(image_path: &Path) -> bool {
        mask_path_for(image_path).exists()
    }

    /// Return the mask path for `image_path`, generating the mask first if it is missing.
    pub fn ensure_mask(&self, image_path: &Path) -> DatasetResult<PathBuf> {
        let mask_path = mask_path_for(image_path);
        if mask_path.exists() {
            debug!(mask = %mask_path.display(), "mask cached");
            return Ok(mask_path);
        }
        let raw = fs::read(image_path).map_err(StellarDatasetError::io(image_path))?;
        let removed = self
            .remover
            .remove(&raw)
            .map_err(|e| StellarDatasetError::BackgroundRemoval {
                path: image_path.to_path_buf(),
                source: e,
            })?;
        let cutout =
            image::load_from_memory(&removed).map_err(StellarDatasetError::image(image_path))?;
        let mut encoded = Cursor::new(Vec::new());
        binarize_foreground(&cutout)
            .write_to(&mut encoded, ImageFormat::Png)
            .map_err(StellarDatasetError::image(&mask_path))?;

        // Only a complete binary mask may appear at `mask_path`.
        let dir = mask_path.parent().unwrap_or_else(|| Path::new("."));
        let mut staged = NamedTempFile::new_in(dir).map_err(StellarDatasetError::io(dir))?;
        staged
            .write_all(encoded.get_ref())
            .map_err(StellarDatasetError::io(staged.path()))?;
        staged
            .persist(&mask_path)
            .map_err(|e| StellarDatasetError::Io {
                path: mask_path.clone(),
                source: e.error,
            })?;
        info!(mask = %mask_path.display(), "generated mask");
        Ok(mask_path)
    }
}
