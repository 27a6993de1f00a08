//! Dataset Model
//!
//! In-memory representation of a classified dataset: which structural layout
//! the directory follows, the class folders found, and informational flags
//! about auxiliary files. Produced by the classifier, consumed read-only by
//! the splitter.

use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// The structural pattern a dataset directory follows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutKind {
    /// Per-class folders directly under the root
    Flat,
    /// Reserved split directories (train/val/valid/test), each holding class folders
    SplitPreexisting,
    /// Neither pattern matched; an expected outcome, not an error
    Unrecognized,
}

impl std::fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LayoutKind::Flat => write!(f, "flat"),
            LayoutKind::SplitPreexisting => write!(f, "split-preexisting"),
            LayoutKind::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// One leaf directory serving as a classification class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassFolder {
    /// Class name (directory basename)
    pub name: String,
    /// Absolute path of the class directory
    pub path: PathBuf,
    /// Image files under the directory (recursive), sorted for determinism
    pub images: Vec<PathBuf>,
    /// Label files tolerated under relaxed classification, tracked separately
    pub label_files: Vec<PathBuf>,
}

/// Why a candidate directory was not accepted as a class folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// Directory contains no files at all (ambiguous, flagged rather than accepted)
    Empty,
    /// A file under the directory disqualified it under the active strictness
    NonImageFile,
    /// Sibling of reserved split directories; not part of the split layout
    OutsideSplits,
}

/// A candidate directory the classifier rejected, with the reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedFolder {
    pub name: String,
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// The classified dataset. Immutable once returned by the classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetModel {
    /// Root directory that was classified
    pub root: PathBuf,
    /// Which structural pattern matched
    pub layout: LayoutKind,
    /// Class folders keyed by class name (populated when layout is Flat)
    pub classes: BTreeMap<String, ClassFolder>,
    /// Split name -> class name -> class folder (populated when SplitPreexisting)
    pub splits: BTreeMap<String, BTreeMap<String, ClassFolder>>,
    /// Candidate directories rejected during classification
    pub skipped: Vec<SkippedFolder>,
    /// Any metadata-category file exists anywhere under root
    pub has_metadata: bool,
    /// Any label-category file exists anywhere under root
    pub has_labels: bool,
}

impl DatasetModel {
    /// All class names in the model, across splits when pre-split.
    pub fn class_names(&self) -> BTreeSet<String> {
        match self.layout {
            LayoutKind::SplitPreexisting => self
                .splits
                .values()
                .flat_map(|classes| classes.keys().cloned())
                .collect(),
            _ => self.classes.keys().cloned().collect(),
        }
    }

    /// Total number of image files in the model.
    pub fn total_images(&self) -> usize {
        match self.layout {
            LayoutKind::SplitPreexisting => self
                .splits
                .values()
                .flat_map(|classes| classes.values())
                .map(|c| c.images.len())
                .sum(),
            _ => self.classes.values().map(|c| c.images.len()).sum(),
        }
    }

    /// For a pre-split dataset, the classes each split is missing relative to
    /// the union over all splits. Splits with a complete class set are omitted.
    /// Classes are recorded here rather than silently dropped.
    pub fn missing_classes(&self) -> BTreeMap<String, BTreeSet<String>> {
        let all = self.class_names();
        let mut missing = BTreeMap::new();

        for (split_name, classes) in &self.splits {
            let present: BTreeSet<String> = classes.keys().cloned().collect();
            let absent: BTreeSet<String> = all.difference(&present).cloned().collect();
            if !absent.is_empty() {
                missing.insert(split_name.clone(), absent);
            }
        }

        missing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn class(name: &str, n_images: usize) -> ClassFolder {
        ClassFolder {
            name: name.to_string(),
            path: PathBuf::from(format!("/data/{}", name)),
            images: (0..n_images)
                .map(|i| PathBuf::from(format!("/data/{}/{}.jpg", name, i)))
                .collect(),
            label_files: Vec::new(),
        }
    }

    #[test]
    fn test_flat_class_names_and_counts() {
        let mut classes = BTreeMap::new();
        classes.insert("cat".to_string(), class("cat", 3));
        classes.insert("dog".to_string(), class("dog", 2));

        let model = DatasetModel {
            root: PathBuf::from("/data"),
            layout: LayoutKind::Flat,
            classes,
            splits: BTreeMap::new(),
            skipped: Vec::new(),
            has_metadata: false,
            has_labels: false,
        };

        assert_eq!(model.total_images(), 5);
        let names: Vec<_> = model.class_names().into_iter().collect();
        assert_eq!(names, vec!["cat".to_string(), "dog".to_string()]);
    }

    #[test]
    fn test_missing_classes_recorded_per_split() {
        let mut train = BTreeMap::new();
        train.insert("cat".to_string(), class("cat", 2));
        train.insert("dog".to_string(), class("dog", 2));
        let mut val = BTreeMap::new();
        val.insert("cat".to_string(), class("cat", 1));

        let mut splits = BTreeMap::new();
        splits.insert("train".to_string(), train);
        splits.insert("val".to_string(), val);

        let model = DatasetModel {
            root: PathBuf::from("/data"),
            layout: LayoutKind::SplitPreexisting,
            classes: BTreeMap::new(),
            splits,
            skipped: Vec::new(),
            has_metadata: false,
            has_labels: false,
        };

        let missing = model.missing_classes();
        assert!(!missing.contains_key("train"));
        assert!(missing["val"].contains("dog"));
    }
}
