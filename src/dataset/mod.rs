//! Dataset layout detection and splitting.
//!
//! The pipeline is: path -> [`classify::classify`] -> [`model::DatasetModel`]
//! -> [`split::plan`] -> [`materialize::materialize`] -> on-disk split layout
//! plus a [`materialize::SplitReport`].

pub mod classify;
pub mod materialize;
pub mod model;
pub mod split;
pub mod taxonomy;

pub use classify::{classify, ClassifyOptions, Strictness};
pub use materialize::{
    materialize, CancelFlag, ClassCounts, MaterializeMode, MaterializeOptions, OnConflict,
    SplitReport,
};
pub use model::{ClassFolder, DatasetModel, LayoutKind, SkipReason, SkippedFolder};
pub use split::{plan, ClassAssignment, SplitNames, SplitPlan, SplitRatios, SplitSpec};
pub use taxonomy::{classify_extension, Category};

/// Directory names that signal a pre-existing train/val/test partition
pub const RESERVED_SPLIT_NAMES: &[&str] = &["train", "val", "valid", "test"];
