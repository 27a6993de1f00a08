//! Split Planning
//!
//! Turns a classified dataset into a deterministic train/valid/test
//! assignment. Each class is shuffled independently with an RNG seeded from
//! the run seed combined with the class name, so the assignment is
//! reproducible and does not depend on the order classes are enumerated in.
//!
//! Planning never touches the filesystem; materialization is a separate step
//! (see [`crate::dataset::materialize`]).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::dataset::model::{ClassFolder, DatasetModel, LayoutKind};
use crate::utils::error::{LasplitError, Result};

/// Tolerance when checking that ratios sum to 1.0
const RATIO_SUM_TOLERANCE: f64 = 1e-6;

/// Target fractions for the three partitions
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitRatios {
    pub train: f64,
    pub valid: f64,
    pub test: f64,
}

impl SplitRatios {
    /// Validate and construct ratios. All three must be non-negative and sum
    /// to 1.0 within a small tolerance.
    pub fn new(train: f64, valid: f64, test: f64) -> Result<Self> {
        if train < 0.0 || valid < 0.0 || test < 0.0 {
            return Err(LasplitError::InvalidRatio(format!(
                "got ({}, {}, {})",
                train, valid, test
            )));
        }
        let sum = train + valid + test;
        if (sum - 1.0).abs() > RATIO_SUM_TOLERANCE {
            return Err(LasplitError::InvalidRatio(format!("sum is {}", sum)));
        }
        Ok(Self { train, valid, test })
    }
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.8,
            valid: 0.1,
            test: 0.1,
        }
    }
}

/// Destination directory names for the three partitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitNames {
    pub train: String,
    pub valid: String,
    pub test: String,
}

impl Default for SplitNames {
    fn default() -> Self {
        Self {
            train: "train".to_string(),
            valid: "valid".to_string(),
            test: "test".to_string(),
        }
    }
}

/// Full specification of a split run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitSpec {
    pub ratios: SplitRatios,
    /// Random seed for reproducibility
    pub seed: u64,
    pub names: SplitNames,
    /// Re-splitting an already-split dataset is an explicit operation, not a
    /// default; without this flag a SplitPreexisting model is rejected.
    pub allow_resplit: bool,
}

impl Default for SplitSpec {
    fn default() -> Self {
        Self {
            ratios: SplitRatios::default(),
            seed: 42,
            names: SplitNames::default(),
            allow_resplit: false,
        }
    }
}

/// The file assignment for one class
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassAssignment {
    pub train: Vec<PathBuf>,
    pub valid: Vec<PathBuf>,
    pub test: Vec<PathBuf>,
}

impl ClassAssignment {
    pub fn total(&self) -> usize {
        self.train.len() + self.valid.len() + self.test.len()
    }
}

/// The planned split: which file goes to which partition, per class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SplitPlan {
    pub ratios: SplitRatios,
    pub seed: u64,
    pub names: SplitNames,
    /// Per-class assignment, keyed by class name
    pub classes: BTreeMap<String, ClassAssignment>,
}

impl SplitPlan {
    pub fn total_files(&self) -> usize {
        self.classes.values().map(|a| a.total()).sum()
    }

    /// Save the plan as pretty JSON for auditing or a later materialize run.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a previously saved plan.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

/// Plan a deterministic split of `model` according to `spec`.
///
/// Fails with [`LasplitError::InvalidRatio`] on bad ratios and with
/// [`LasplitError::UnsupportedLayout`] if the layout is Unrecognized, or
/// SplitPreexisting without `allow_resplit`. All validation happens up
/// front; planning itself cannot fail per class.
pub fn plan(model: &DatasetModel, spec: &SplitSpec) -> Result<SplitPlan> {
    // Ratio fields are public; re-validate so the contract holds no matter
    // how the spec was constructed.
    SplitRatios::new(spec.ratios.train, spec.ratios.valid, spec.ratios.test)?;

    match model.layout {
        LayoutKind::Unrecognized => {
            return Err(LasplitError::UnsupportedLayout(format!(
                "'{}' was not recognized as a dataset - nothing to split",
                model.root.display()
            )));
        }
        LayoutKind::SplitPreexisting if !spec.allow_resplit => {
            return Err(LasplitError::UnsupportedLayout(format!(
                "'{}' already contains train/val/test splits - pass --allow-resplit to re-split it",
                model.root.display()
            )));
        }
        _ => {}
    }

    info!(
        "Planning split with ratios ({}, {}, {}), seed {}",
        spec.ratios.train, spec.ratios.valid, spec.ratios.test, spec.seed
    );

    let mut classes = BTreeMap::new();
    for (name, files) in pooled_class_files(model) {
        let assignment = assign_class(&name, files, &spec.ratios, spec.seed);
        debug!(
            "Class '{}': {} train / {} valid / {} test",
            name,
            assignment.train.len(),
            assignment.valid.len(),
            assignment.test.len()
        );
        classes.insert(name, assignment);
    }

    Ok(SplitPlan {
        ratios: spec.ratios,
        seed: spec.seed,
        names: spec.names.clone(),
        classes,
    })
}

/// Per-class file lists, pooled across pre-existing splits when re-splitting.
fn pooled_class_files(model: &DatasetModel) -> BTreeMap<String, Vec<PathBuf>> {
    let mut pooled: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    let folders: Vec<&ClassFolder> = match model.layout {
        LayoutKind::SplitPreexisting => model
            .splits
            .values()
            .flat_map(|classes| classes.values())
            .collect(),
        _ => model.classes.values().collect(),
    };

    for folder in folders {
        pooled
            .entry(folder.name.clone())
            .or_default()
            .extend(folder.images.iter().cloned());
    }

    // Sorted inputs keep the shuffle a pure function of (files, seed, class).
    for files in pooled.values_mut() {
        files.sort();
    }

    pooled
}

/// Shuffle one class deterministically and cut at the ratio boundaries.
/// Boundaries use floor, so each cut is off by at most one file from the
/// exact ratio; the remainder always lands in test.
fn assign_class(
    class_name: &str,
    mut files: Vec<PathBuf>,
    ratios: &SplitRatios,
    seed: u64,
) -> ClassAssignment {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ fnv1a64(class_name.as_bytes()));
    files.shuffle(&mut rng);

    let n = files.len();
    let train_end = (n as f64 * ratios.train).floor() as usize;
    let valid_end = (n as f64 * (ratios.train + ratios.valid)).floor() as usize;
    let valid_end = valid_end.min(n).max(train_end);

    let test = files.split_off(valid_end);
    let valid = files.split_off(train_end);

    ClassAssignment {
        train: files,
        valid,
        test,
    }
}

/// FNV-1a 64-bit hash. Used to derive a per-class seed; the std hasher is not
/// guaranteed stable across releases, and reproducibility matters here.
fn fnv1a64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= b as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}
