//! Split Materialization
//!
//! Writes a [`SplitPlan`] to disk as `<dest>/<split>/<class>/<file>`, by copy
//! or by move. All preconditions are validated before any file is touched;
//! move mode is all-or-nothing per file, so a half-moved file never exists.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dataset::split::{SplitPlan, SplitRatios};
use crate::utils::error::{LasplitError, Result};

/// File name of the JSON summary written into the destination
pub const REPORT_FILE_NAME: &str = "split_report.json";

/// How files reach the destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterializeMode {
    /// Source tree is left untouched; safe to retry
    Copy,
    /// Source files are removed once their destination copy is in place
    Move,
}

/// What to do when a target path already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OnConflict {
    /// Abort before writing anything
    #[default]
    Fail,
    /// Replace the existing file
    Overwrite,
    /// Leave the existing file and record the skip in the report
    Skip,
}

/// Cooperative cancellation flag, checked between file operations.
/// Cancelling leaves already-materialized files in place; no file is ever
/// left torn.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Options for a materialize run
#[derive(Debug, Clone, Default)]
pub struct MaterializeOptions {
    pub mode: MaterializeMode,
    pub on_conflict: OnConflict,
    /// Optional cancellation flag shared with the caller
    pub cancel: Option<CancelFlag>,
    /// Suppress writing `split_report.json` into the destination
    pub skip_report_file: bool,
}

impl Default for MaterializeMode {
    fn default() -> Self {
        MaterializeMode::Copy
    }
}

/// Per-class file counts in each partition
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassCounts {
    pub train: usize,
    pub valid: usize,
    pub test: usize,
}

/// Summary of a materialize run, also written as JSON into the destination
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SplitReport {
    pub ratios: SplitRatios,
    pub seed: u64,
    pub mode: MaterializeMode,
    pub destination: PathBuf,
    /// Counts of files written, per class
    pub classes: BTreeMap<String, ClassCounts>,
    /// Target paths left alone because they already existed (Skip policy)
    pub skipped_conflicts: Vec<PathBuf>,
    /// True when the run was cancelled before completing
    pub cancelled: bool,
    pub files_written: usize,
}

/// One planned file operation
struct FileOp {
    source: PathBuf,
    target: PathBuf,
    class: String,
    partition: Partition,
}

#[derive(Clone, Copy)]
enum Partition {
    Train,
    Valid,
    Test,
}

/// Materialize `plan` under `dest`.
///
/// Fails with [`LasplitError::DestinationConflict`] during preflight if any
/// target exists and the policy is [`OnConflict::Fail`]; at that point no
/// file has been written. A move-mode failure after some files completed
/// surfaces as [`LasplitError::PartialWrite`] naming how many finished.
pub fn materialize(
    plan: &SplitPlan,
    dest: &Path,
    options: &MaterializeOptions,
) -> Result<SplitReport> {
    let ops = collect_ops(plan, dest);

    // Preflight: every conflict is known before the first write.
    let conflicts: Vec<&FileOp> = ops.iter().filter(|op| op.target.exists()).collect();
    if !conflicts.is_empty() {
        match options.on_conflict {
            OnConflict::Fail => {
                return Err(LasplitError::DestinationConflict {
                    count: conflicts.len(),
                    first: conflicts[0].target.clone(),
                });
            }
            OnConflict::Overwrite => {
                warn!("Overwriting {} existing target file(s)", conflicts.len());
            }
            OnConflict::Skip => {
                info!("Skipping {} existing target file(s)", conflicts.len());
            }
        }
    }

    info!(
        "Materializing {} file(s) to {:?} ({} mode)",
        ops.len(),
        dest,
        match options.mode {
            MaterializeMode::Copy => "copy",
            MaterializeMode::Move => "move",
        }
    );

    let mut report = SplitReport {
        ratios: plan.ratios,
        seed: plan.seed,
        mode: options.mode,
        destination: dest.to_path_buf(),
        classes: BTreeMap::new(),
        skipped_conflicts: Vec::new(),
        cancelled: false,
        files_written: 0,
    };

    let mut completed: usize = 0;
    for op in &ops {
        if let Some(cancel) = &options.cancel {
            if cancel.is_cancelled() {
                warn!("Materialization cancelled after {} file(s)", completed);
                report.cancelled = true;
                break;
            }
        }

        if op.target.exists() && options.on_conflict == OnConflict::Skip {
            report.skipped_conflicts.push(op.target.clone());
            continue;
        }

        if let Some(parent) = op.target.parent() {
            fs::create_dir_all(parent)?;
        }

        match options.mode {
            MaterializeMode::Copy => {
                // A failed copy leaves the source untouched; plain propagation
                // is enough to support retry.
                fs::copy(&op.source, &op.target)?;
            }
            MaterializeMode::Move => {
                move_file(&op.source, &op.target).map_err(|e| LasplitError::PartialWrite {
                    completed,
                    failed: op.source.clone(),
                    reason: e.to_string(),
                })?;
            }
        }

        debug!("{:?} -> {:?}", op.source, op.target);
        completed += 1;
        report.files_written += 1;
        let counts = report.classes.entry(op.class.clone()).or_default();
        match op.partition {
            Partition::Train => counts.train += 1,
            Partition::Valid => counts.valid += 1,
            Partition::Test => counts.test += 1,
        }
    }

    if !options.skip_report_file {
        fs::create_dir_all(dest)?;
        let report_path = dest.join(REPORT_FILE_NAME);
        fs::write(&report_path, serde_json::to_string_pretty(&report)?)?;
        debug!("Report written to {:?}", report_path);
    }

    Ok(report)
}

/// Expand the plan into concrete file operations. Duplicate basenames within
/// one class partition (possible with nested source folders) get a numeric
/// suffix so no planned file silently overwrites another.
fn collect_ops(plan: &SplitPlan, dest: &Path) -> Vec<FileOp> {
    let mut ops = Vec::new();
    let mut used: HashSet<PathBuf> = HashSet::new();

    for (class, assignment) in &plan.classes {
        let partitions = [
            (Partition::Train, &plan.names.train, &assignment.train),
            (Partition::Valid, &plan.names.valid, &assignment.valid),
            (Partition::Test, &plan.names.test, &assignment.test),
        ];
        for (partition, split_name, files) in partitions {
            let class_dir = dest.join(split_name).join(class);
            for source in files {
                let target = unique_target(&class_dir, source, &mut used);
                ops.push(FileOp {
                    source: source.clone(),
                    target,
                    class: class.clone(),
                    partition,
                });
            }
        }
    }

    ops
}

fn unique_target(class_dir: &Path, source: &Path, used: &mut HashSet<PathBuf>) -> PathBuf {
    let file_name = source
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mut target = class_dir.join(&file_name);

    let mut counter = 1;
    while used.contains(&target) {
        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let renamed = match source.extension().and_then(|e| e.to_str()) {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        target = class_dir.join(renamed);
        counter += 1;
    }

    used.insert(target.clone());
    target
}

/// Move one file without ever exposing a torn target. A same-filesystem
/// rename is already atomic; across filesystems, copy to a temporary name in
/// the destination directory, rename into place, then remove the source.
fn move_file(source: &Path, target: &Path) -> std::io::Result<()> {
    if fs::rename(source, target).is_ok() {
        return Ok(());
    }

    let tmp = target.with_file_name(format!(
        ".tmp-{}",
        target
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    ));

    if let Err(e) = fs::copy(source, &tmp).and_then(|_| fs::rename(&tmp, target)) {
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    fs::remove_file(source)
}
