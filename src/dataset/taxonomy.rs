//! Extension Taxonomy
//!
//! Single source of truth for classifying files by extension. Every extension
//! maps to exactly one category; new formats are added by editing the tables
//! below, never by touching classification logic.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// What kind of file an extension denotes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Image content (jpg, png, raw formats, ...)
    Image,
    /// Annotation sidecar files (VOC xml and friends)
    Label,
    /// Dataset metadata (csv manifests, notes, checkpoints)
    Metadata,
    /// Anything else, including files without an extension
    Other,
}

/// Extensions recognized as images (lower-case, no leading dot)
const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "webp", "svg", "heif", "heic", "cr2",
    "nef", "arw", "dng",
];

/// Extensions recognized as label/annotation files
const LABEL_EXTENSIONS: &[&str] = &["xml", "lbl"];

/// Extensions recognized as dataset metadata
const METADATA_EXTENSIONS: &[&str] = &["csv", "txt", "pt", "json", "yaml", "yml", "md"];

/// Classify a file path by its extension, case-insensitively.
///
/// Files with no extension, or with an extension in none of the tables,
/// classify as [`Category::Other`].
pub fn classify_extension(path: &Path) -> Category {
    let ext = match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => ext.to_lowercase(),
        None => return Category::Other,
    };

    if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
        Category::Image
    } else if LABEL_EXTENSIONS.contains(&ext.as_str()) {
        Category::Label
    } else if METADATA_EXTENSIONS.contains(&ext.as_str()) {
        Category::Metadata
    } else {
        Category::Other
    }
}
