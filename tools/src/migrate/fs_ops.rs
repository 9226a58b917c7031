use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Serialize;

pub fn ensure_dataset_dir(dataset_dir: &Path) -> Result<()> {
    if !dataset_dir.is_dir() {
        bail!(
            "invalid dataset directory: {}; it must already exist and contain the required files",
            dataset_dir.display()
        );
    }
    Ok(())
}

/// Pretty JSON with four-space indentation.
pub fn write_pretty_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    value
        .serialize(&mut ser)
        .with_context(|| format!("serialize {}", path.display()))?;
    fs::write(path, buf).with_context(|| format!("write {}", path.display()))
}

/// Move `from` to `to`, creating missing parents of `to` and then removing
/// directories left empty above `from`, up to (not including) `stop_at`.
pub fn renames(from: &Path, to: &Path, stop_at: &Path) -> Result<()> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    fs::rename(from, to)
        .with_context(|| format!("move {} to {}", from.display(), to.display()))?;
    let mut dir = from.parent();
    while let Some(current) = dir {
        if current == stop_at || !current.starts_with(stop_at) {
            break;
        }
        // Fails on non-empty directories, which ends the pruning.
        if fs::remove_dir(current).is_err() {
            break;
        }
        dir = current.parent();
    }
    Ok(())
}

pub fn remove_dir_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path).with_context(|| format!("remove {}", path.display()))?;
    }
    Ok(())
}

pub fn remove_file_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("remove {}", path.display()))?;
    }
    Ok(())
}
