//! Layout Classifier
//!
//! Walks a directory tree and decides whether it matches a supported
//! image-dataset shape: flat per-class folders, or a pre-existing
//! train/val/test partition with class folders inside each split.
//!
//! Classification is a pure traversal: read-only, deterministic for identical
//! tree contents, and it never fails for "not a dataset" - that is the
//! [`LayoutKind::Unrecognized`] outcome, which callers must check.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::dataset::model::{
    ClassFolder, DatasetModel, LayoutKind, SkipReason, SkippedFolder,
};
use crate::dataset::taxonomy::{classify_extension, Category};
use crate::dataset::RESERVED_SPLIT_NAMES;
use crate::utils::error::{LasplitError, Result};

/// Controls whether label files disqualify a class folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Strictness {
    /// Every file under a class folder must classify as an image
    Strict,
    /// Label files are tolerated and counted; metadata and other files are
    /// ignored; at least one image is still required
    #[default]
    Relaxed,
}

/// Options for a classification run
#[derive(Debug, Clone, Default)]
pub struct ClassifyOptions {
    pub strictness: Strictness,
}

/// Classify the directory tree rooted at `root`.
///
/// Fails with [`LasplitError::NotFound`] if `root` is missing or not a
/// directory, and with [`LasplitError::EmptyDataset`] if it has no
/// subdirectories. Any other outcome, including an arbitrary non-dataset
/// directory, is a successfully returned model.
pub fn classify(root: &Path, options: &ClassifyOptions) -> Result<DatasetModel> {
    if !root.is_dir() {
        return Err(LasplitError::NotFound(root.to_path_buf()));
    }

    info!("Classifying dataset layout at {:?}", root);

    let candidates = immediate_subdirs(root)?;
    if candidates.is_empty() {
        return Err(LasplitError::EmptyDataset(root.to_path_buf()));
    }

    let mut skipped = Vec::new();

    // Reserved split names take priority over the flat interpretation: a
    // train/val/test structure is the more specific pattern.
    let reserved: Vec<&PathBuf> = candidates
        .iter()
        .filter(|dir| is_reserved_split_name(dir.as_path()))
        .collect();

    let (layout, classes, splits) = if !reserved.is_empty() {
        // Non-reserved siblings play no part in the split interpretation,
        // but every candidate must be accounted for in the model.
        for candidate in &candidates {
            if !is_reserved_split_name(candidate.as_path()) {
                skipped.push(SkippedFolder {
                    name: dir_name(candidate),
                    path: candidate.clone(),
                    reason: SkipReason::OutsideSplits,
                });
            }
        }

        let mut splits: BTreeMap<String, BTreeMap<String, ClassFolder>> = BTreeMap::new();
        for split_dir in reserved {
            let split_name = dir_name(split_dir);
            let split_candidates = immediate_subdirs(split_dir)?;
            let mut classes = BTreeMap::new();
            for candidate in &split_candidates {
                match scan_class_folder(candidate, options.strictness)? {
                    ScanOutcome::Valid(folder) => {
                        debug!(
                            "Split '{}' class '{}': {} image(s)",
                            split_name,
                            folder.name,
                            folder.images.len()
                        );
                        classes.insert(folder.name.clone(), folder);
                    }
                    ScanOutcome::Skipped(reason) => skipped.push(SkippedFolder {
                        name: dir_name(candidate),
                        path: candidate.clone(),
                        reason,
                    }),
                }
            }
            // A reserved directory with no valid classes is recorded as
            // present-but-empty; missing split names are simply absent.
            splits.insert(split_name, classes);
        }

        let any_valid = splits.values().any(|c| !c.is_empty());
        if any_valid {
            (LayoutKind::SplitPreexisting, BTreeMap::new(), splits)
        } else {
            (LayoutKind::Unrecognized, BTreeMap::new(), BTreeMap::new())
        }
    } else {
        let mut classes = BTreeMap::new();
        for candidate in &candidates {
            match scan_class_folder(candidate, options.strictness)? {
                ScanOutcome::Valid(folder) => {
                    debug!("Class '{}': {} image(s)", folder.name, folder.images.len());
                    classes.insert(folder.name.clone(), folder);
                }
                ScanOutcome::Skipped(reason) => skipped.push(SkippedFolder {
                    name: dir_name(candidate),
                    path: candidate.clone(),
                    reason,
                }),
            }
        }

        if classes.is_empty() {
            (LayoutKind::Unrecognized, BTreeMap::new(), BTreeMap::new())
        } else {
            (LayoutKind::Flat, classes, BTreeMap::new())
        }
    };

    let (has_metadata, has_labels) = scan_auxiliary_flags(root);

    info!(
        "Layout: {} ({} class(es), {} skipped)",
        layout,
        match layout {
            LayoutKind::SplitPreexisting => splits
                .values()
                .flat_map(|c| c.keys())
                .collect::<std::collections::BTreeSet<_>>()
                .len(),
            _ => classes.len(),
        },
        skipped.len()
    );

    Ok(DatasetModel {
        root: root.to_path_buf(),
        layout,
        classes,
        splits,
        skipped,
        has_metadata,
        has_labels,
    })
}

/// Sorted immediate subdirectories of `dir`.
fn immediate_subdirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut subdirs = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            subdirs.push(entry.path());
        }
    }
    subdirs.sort();
    Ok(subdirs)
}

fn dir_name(dir: &Path) -> String {
    dir.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Matched case-insensitively: `Train/` on a case-insensitive filesystem is
/// the same directory as `train/`, so a case-sensitive match would classify
/// the same tree differently across platforms.
fn is_reserved_split_name(dir: &Path) -> bool {
    let name = dir_name(dir).to_lowercase();
    RESERVED_SPLIT_NAMES.contains(&name.as_str())
}

/// Outcome of probing one class-folder candidate
enum ScanOutcome {
    Valid(ClassFolder),
    Skipped(SkipReason),
}

/// Test whether `dir` qualifies as a class folder, collecting its image and
/// label files recursively. A directory with zero files is rejected as
/// ambiguous rather than silently accepted.
///
/// Filesystem-access failures during the walk (say an unreadable
/// subdirectory) propagate as errors: a model silently missing files would
/// poison every split planned from it.
fn scan_class_folder(dir: &Path, strictness: Strictness) -> Result<ScanOutcome> {
    let mut images = Vec::new();
    let mut label_files = Vec::new();
    let mut saw_file = false;

    for entry in WalkDir::new(dir).min_depth(1) {
        let entry = entry.map_err(std::io::Error::from)?;
        if !entry.file_type().is_file() {
            continue;
        }
        saw_file = true;
        let path = entry.path().to_path_buf();

        match classify_extension(&path) {
            Category::Image => images.push(path),
            Category::Label => match strictness {
                Strictness::Strict => return Ok(ScanOutcome::Skipped(SkipReason::NonImageFile)),
                Strictness::Relaxed => label_files.push(path),
            },
            Category::Metadata | Category::Other => match strictness {
                Strictness::Strict => return Ok(ScanOutcome::Skipped(SkipReason::NonImageFile)),
                Strictness::Relaxed => {}
            },
        }
    }

    if !saw_file {
        return Ok(ScanOutcome::Skipped(SkipReason::Empty));
    }
    if images.is_empty() {
        return Ok(ScanOutcome::Skipped(SkipReason::NonImageFile));
    }

    images.sort();
    label_files.sort();

    Ok(ScanOutcome::Valid(ClassFolder {
        name: dir_name(dir),
        path: dir.to_path_buf(),
        images,
        label_files,
    }))
}

/// One full-tree walk computing the informational metadata/label flags.
/// These never influence the layout decision, so unreadable entries are
/// logged and skipped rather than failing the classification.
fn scan_auxiliary_flags(root: &Path) -> (bool, bool) {
    let mut has_metadata = false;
    let mut has_labels = false;

    for entry in WalkDir::new(root) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!("Skipping unreadable entry during auxiliary-file scan: {}", e);
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        match classify_extension(entry.path()) {
            Category::Metadata => has_metadata = true,
            Category::Label => has_labels = true,
            _ => {}
        }
        if has_metadata && has_labels {
            break;
        }
    }

    (has_metadata, has_labels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::File;
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) {
        File::create(dir.join(name)).unwrap();
    }

    fn make_class(root: &Path, name: &str, images: &[&str]) -> PathBuf {
        let dir = root.join(name);
        fs::create_dir_all(&dir).unwrap();
        for img in images {
            touch(&dir, img);
        }
        dir
    }

    #[test]
    fn test_flat_layout_detected() {
        let dir = TempDir::new().unwrap();
        make_class(dir.path(), "cat", &["a.jpg", "b.jpg", "c.jpg"]);
        make_class(dir.path(), "dog", &["x.png", "y.png"]);

        let model = classify(dir.path(), &ClassifyOptions::default()).unwrap();
        assert_eq!(model.layout, LayoutKind::Flat);
        let names: Vec<_> = model.class_names().into_iter().collect();
        assert_eq!(names, vec!["cat".to_string(), "dog".to_string()]);
        assert_eq!(model.total_images(), 5);
    }

    #[test]
    fn test_split_layout_beats_flat() {
        let dir = TempDir::new().unwrap();
        // Both patterns present: reserved names must win.
        let train = dir.path().join("train");
        let val = dir.path().join("val");
        fs::create_dir_all(&train).unwrap();
        fs::create_dir_all(&val).unwrap();
        make_class(&train, "cat", &["a.jpg"]);
        make_class(&val, "cat", &["b.jpg"]);
        make_class(dir.path(), "stray_class", &["z.jpg"]);

        let model = classify(dir.path(), &ClassifyOptions::default()).unwrap();
        assert_eq!(model.layout, LayoutKind::SplitPreexisting);
        assert!(model.splits.contains_key("train"));
        assert!(model.splits.contains_key("val"));

        // The stray sibling is accounted for, not silently dropped.
        assert_eq!(model.skipped.len(), 1);
        assert_eq!(model.skipped[0].name, "stray_class");
        assert_eq!(model.skipped[0].reason, SkipReason::OutsideSplits);
    }

    #[test]
    fn test_reserved_names_match_case_insensitively() {
        let dir = TempDir::new().unwrap();
        let train = dir.path().join("Train");
        let test = dir.path().join("TEST");
        fs::create_dir_all(&train).unwrap();
        fs::create_dir_all(&test).unwrap();
        make_class(&train, "cat", &["a.jpg"]);
        make_class(&test, "cat", &["b.jpg"]);

        let model = classify(dir.path(), &ClassifyOptions::default()).unwrap();
        assert_eq!(model.layout, LayoutKind::SplitPreexisting);
        // Splits keep their on-disk names.
        assert!(model.splits.contains_key("Train"));
        assert!(model.splits.contains_key("TEST"));
    }

    /// An unreadable subdirectory inside a class folder must never produce a
    /// silently truncated model: either the walk sees every file or
    /// classification fails with an IO error. (Privileged processes can read
    /// regardless of permissions, hence the two accepted outcomes.)
    #[cfg(unix)]
    #[test]
    fn test_unreadable_subdir_never_truncates_silently() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let cat = make_class(dir.path(), "cat", &["a.jpg"]);
        let nested = cat.join("closeups");
        fs::create_dir_all(&nested).unwrap();
        touch(&nested, "b.jpg");
        fs::set_permissions(&nested, fs::Permissions::from_mode(0o000)).unwrap();

        let result = classify(dir.path(), &ClassifyOptions::default());

        // Restore permissions so the temp dir can be cleaned up.
        fs::set_permissions(&nested, fs::Permissions::from_mode(0o755)).unwrap();

        match result {
            Ok(model) => assert_eq!(model.classes["cat"].images.len(), 2),
            Err(err) => assert!(matches!(err, LasplitError::Io(_))),
        }
    }

    #[test]
    fn test_missing_test_split_is_absent_not_error() {
        let dir = TempDir::new().unwrap();
        let train = dir.path().join("train");
        let val = dir.path().join("val");
        fs::create_dir_all(&train).unwrap();
        fs::create_dir_all(&val).unwrap();
        make_class(&train, "cat", &["a.jpg"]);
        make_class(&val, "cat", &["b.jpg"]);

        let model = classify(dir.path(), &ClassifyOptions::default()).unwrap();
        assert_eq!(model.layout, LayoutKind::SplitPreexisting);
        assert!(!model.splits.contains_key("test"));
    }

    #[test]
    fn test_strict_disqualifies_on_stray_file() {
        let dir = TempDir::new().unwrap();
        let cat = make_class(dir.path(), "cat", &["a.jpg", "b.jpg"]);
        touch(&cat, "notes.docx");

        let strict = ClassifyOptions {
            strictness: Strictness::Strict,
        };
        let model = classify(dir.path(), &strict).unwrap();
        assert_eq!(model.layout, LayoutKind::Unrecognized);
        assert_eq!(model.skipped.len(), 1);
        assert_eq!(model.skipped[0].reason, SkipReason::NonImageFile);

        let relaxed = ClassifyOptions {
            strictness: Strictness::Relaxed,
        };
        let model = classify(dir.path(), &relaxed).unwrap();
        assert_eq!(model.layout, LayoutKind::Flat);
    }

    #[test]
    fn test_relaxed_tracks_label_files() {
        let dir = TempDir::new().unwrap();
        let cat = make_class(dir.path(), "cat", &["a.jpg"]);
        touch(&cat, "a.xml");

        let model = classify(dir.path(), &ClassifyOptions::default()).unwrap();
        assert_eq!(model.layout, LayoutKind::Flat);
        assert_eq!(model.classes["cat"].label_files.len(), 1);
        assert!(model.has_labels);
    }

    #[test]
    fn test_empty_class_folder_flagged() {
        let dir = TempDir::new().unwrap();
        make_class(dir.path(), "cat", &["a.jpg"]);
        fs::create_dir_all(dir.path().join("empty_class")).unwrap();

        let model = classify(dir.path(), &ClassifyOptions::default()).unwrap();
        assert_eq!(model.layout, LayoutKind::Flat);
        assert_eq!(model.skipped.len(), 1);
        assert_eq!(model.skipped[0].reason, SkipReason::Empty);
    }

    #[test]
    fn test_metadata_flag_is_informational() {
        let dir = TempDir::new().unwrap();
        make_class(dir.path(), "cat", &["a.jpg"]);
        touch(dir.path(), "manifest.csv");

        let model = classify(dir.path(), &ClassifyOptions::default()).unwrap();
        assert_eq!(model.layout, LayoutKind::Flat);
        assert!(model.has_metadata);
        assert!(!model.has_labels);
    }

    #[test]
    fn test_missing_path_errors() {
        let err = classify(Path::new("/no/such/dir"), &ClassifyOptions::default()).unwrap_err();
        assert!(matches!(err, LasplitError::NotFound(_)));
    }

    #[test]
    fn test_empty_root_errors() {
        let dir = TempDir::new().unwrap();
        let err = classify(dir.path(), &ClassifyOptions::default()).unwrap_err();
        assert!(matches!(err, LasplitError::EmptyDataset(_)));
    }

    #[test]
    fn test_nested_images_count_transitively() {
        let dir = TempDir::new().unwrap();
        let cat = make_class(dir.path(), "cat", &["a.jpg"]);
        let nested = cat.join("closeups");
        fs::create_dir_all(&nested).unwrap();
        touch(&nested, "b.jpg");

        let model = classify(dir.path(), &ClassifyOptions::default()).unwrap();
        assert_eq!(model.classes["cat"].images.len(), 2);
    }

    #[test]
    fn test_unrecognized_is_a_value_not_an_error() {
        let dir = TempDir::new().unwrap();
        let sub = dir.path().join("sources");
        fs::create_dir_all(&sub).unwrap();
        touch(&sub, "main.c");

        let model = classify(dir.path(), &ClassifyOptions::default()).unwrap();
        assert_eq!(model.layout, LayoutKind::Unrecognized);
    }
}
