//! File naming rules for identity folders.

use std::path::{Path, PathBuf};

/// Simple layout: one prompt group shared by every image of the identity.
pub const PROMPT_FILE: &str = "prompt.json";
/// Targeted prompts, present for every identity in the richer layout.
pub const TARGETED_PROMPT_FILE: &str = "prompts_t.json";
/// Held-out prompts, present only for held-out identities.
pub const HELD_OUT_PROMPT_FILE: &str = "prompts_h.json";

pub const MASK_SUFFIX: &str = "_bg";
pub const ATTRIBUTES_SUFFIX: &str = "_attributes";
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

fn file_stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

/// True for source images: a known extension (case-sensitive) and not a cached mask.
pub fn is_source_image(path: &Path) -> bool {
    let ext_ok = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| IMAGE_EXTENSIONS.contains(&e));
    ext_ok && file_stem(path).is_some_and(|s| !s.ends_with(MASK_SUFFIX))
}

pub fn is_attributes_file(path: &Path) -> bool {
    path.extension().and_then(|e| e.to_str()) == Some("json")
        && file_stem(path).is_some_and(|s| s.ends_with(ATTRIBUTES_SUFFIX))
}

/// `dir/{stem}_bg.png` next to the image.
pub fn mask_path_for(image: &Path) -> PathBuf {
    sibling_with_suffix(image, MASK_SUFFIX, "png")
}

/// `dir/{stem}_attributes.json` next to the image.
pub fn attributes_path_for(image: &Path) -> PathBuf {
    sibling_with_suffix(image, ATTRIBUTES_SUFFIX, "json")
}

fn sibling_with_suffix(image: &Path, suffix: &str, ext: &str) -> PathBuf {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = format!("{stem}{suffix}.{ext}");
    match image.parent() {
        Some(parent) => parent.join(name),
        None => PathBuf::from(name),
    }
}

/// Identity folders are named with ASCII digits only (`000`, `017`, `203`).
pub fn parse_identity_ordinal(name: &str) -> Option<u32> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}
