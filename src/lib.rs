//! # lasplit
//!
//! Detects whether a directory tree follows a recognizable
//! image-classification dataset layout, and deterministically splits a
//! detected dataset into train/valid/test partitions on disk.
//!
//! ## Modules
//!
//! - `dataset`: extension taxonomy, layout classification, split planning and
//!   materialization
//! - `utils`: error types, logging setup, and tree rendering for the CLI
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lasplit::dataset::{classify, plan, materialize};
//! use lasplit::dataset::{ClassifyOptions, SplitSpec, MaterializeOptions};
//!
//! let model = classify("data/flowers".as_ref(), &ClassifyOptions::default())?;
//! let plan = plan(&model, &SplitSpec::default())?;
//! let report = materialize(&plan, "data/flowers_split".as_ref(), &MaterializeOptions::default())?;
//! ```
//!
//! Classification never fails for "not a dataset" - that outcome is the
//! [`dataset::LayoutKind::Unrecognized`] value, which callers must check.
//! Nothing in this library runs as a side effect of being loaded.

pub mod dataset;
pub mod utils;

pub use dataset::{
    classify, materialize, plan, ClassifyOptions, DatasetModel, LayoutKind, MaterializeOptions,
    SplitPlan, SplitRatios, SplitReport, SplitSpec, Strictness,
};
pub use utils::error::{LasplitError, Result};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
