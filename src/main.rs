//! lasplit CLI
//!
//! Thin wrapper over the library: `classify` inspects a directory tree and
//! reports the detected layout; `split` plans and materializes a
//! train/valid/test partition. Exit codes are distinct per failure class so
//! scripts can react to them.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;

use lasplit::dataset::{
    classify, materialize, plan, ClassifyOptions, LayoutKind, MaterializeMode,
    MaterializeOptions, OnConflict, SplitNames, SplitPlan, SplitRatios, SplitSpec, Strictness,
};
use lasplit::utils::logging::{init_logging, LogConfig};
use lasplit::utils::tree::render_tree;
use lasplit::{LasplitError, Result};

/// Exit codes, distinct per failure class
const EXIT_INVALID_PATH: u8 = 2;
const EXIT_UNRECOGNIZED: u8 = 3;
const EXIT_INVALID_RATIOS: u8 = 4;
const EXIT_CONFLICT: u8 = 5;

/// Detect and split image-classification dataset layouts
#[derive(Parser, Debug)]
#[command(name = "lasplit")]
#[command(version)]
#[command(about = "Detect image-dataset layouts and split them into train/valid/test", long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, default_value = "false")]
    verbose: bool,

    /// Only log errors
    #[arg(short, long, default_value = "false", conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect a directory and report the detected dataset layout
    Classify {
        /// Dataset root directory
        path: PathBuf,

        /// Disqualify class folders containing any non-image file
        #[arg(long, default_value = "false")]
        strict: bool,

        /// Also print the folder tree
        #[arg(long, default_value = "false")]
        tree: bool,
    },

    /// Split a detected dataset into train/valid/test partitions
    Split {
        /// Dataset root directory
        path: PathBuf,

        /// Directory name for the train partition
        train: String,

        /// Directory name for the validation partition
        valid: String,

        /// Directory name for the test partition
        test: String,

        /// Split ratios as train,valid,test (must sum to 1.0)
        #[arg(long, default_value = "0.8,0.1,0.1")]
        ratios: String,

        /// Random seed for reproducible assignment
        #[arg(long, default_value = "42")]
        seed: u64,

        /// Transfer mode: copy or move
        #[arg(long, default_value = "copy")]
        mode: String,

        /// Destination directory (default: <path>_split next to the source)
        #[arg(long)]
        dest: Option<PathBuf>,

        /// Disqualify class folders containing any non-image file
        #[arg(long, default_value = "false")]
        strict: bool,

        /// Allow re-splitting a dataset that already has train/val/test splits
        #[arg(long, default_value = "false")]
        allow_resplit: bool,

        /// Overwrite existing files at the destination
        #[arg(long, default_value = "false")]
        overwrite: bool,

        /// Print the plan without touching the filesystem
        #[arg(long, default_value = "false")]
        dry_run: bool,

        /// Also write the plan as JSON, for auditing or a later `apply`
        #[arg(long)]
        plan_out: Option<PathBuf>,
    },

    /// Materialize a split plan previously saved with `split --plan-out`
    Apply {
        /// Path to the plan JSON file
        plan: PathBuf,

        /// Destination directory
        #[arg(long)]
        dest: PathBuf,

        /// Transfer mode: copy or move
        #[arg(long, default_value = "copy")]
        mode: String,

        /// Overwrite existing files at the destination
        #[arg(long, default_value = "false")]
        overwrite: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let log_config = log_config_for(cli.verbose, cli.quiet);
    if let Err(e) = init_logging(&log_config) {
        eprintln!("{}", e);
        return ExitCode::FAILURE;
    }

    let result = match cli.command {
        Commands::Classify { path, strict, tree } => cmd_classify(&path, strict, tree),
        Commands::Split {
            path,
            train,
            valid,
            test,
            ratios,
            seed,
            mode,
            dest,
            strict,
            allow_resplit,
            overwrite,
            dry_run,
            plan_out,
        } => cmd_split(SplitArgs {
            path,
            names: SplitNames { train, valid, test },
            ratios,
            seed,
            mode,
            dest,
            strict,
            allow_resplit,
            overwrite,
            dry_run,
            plan_out,
        }),
        Commands::Apply {
            plan,
            dest,
            mode,
            overwrite,
        } => cmd_apply(&plan, &dest, &mode, overwrite),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{} {}", "error:".red().bold(), err);
            ExitCode::from(exit_code_for(&err))
        }
    }
}

fn exit_code_for(err: &LasplitError) -> u8 {
    match err {
        LasplitError::NotFound(_) | LasplitError::EmptyDataset(_) => EXIT_INVALID_PATH,
        LasplitError::UnsupportedLayout(_) => EXIT_UNRECOGNIZED,
        LasplitError::InvalidRatio(_) => EXIT_INVALID_RATIOS,
        LasplitError::DestinationConflict { .. } => EXIT_CONFLICT,
        _ => 1,
    }
}

fn log_config_for(verbose: bool, quiet: bool) -> LogConfig {
    if quiet {
        LogConfig::quiet()
    } else if verbose {
        LogConfig::verbose()
    } else {
        LogConfig::default()
    }
}

fn strictness_of(strict: bool) -> Strictness {
    if strict {
        Strictness::Strict
    } else {
        Strictness::Relaxed
    }
}

fn cmd_classify(path: &Path, strict: bool, tree: bool) -> Result<()> {
    let options = ClassifyOptions {
        strictness: strictness_of(strict),
    };
    let model = classify(path, &options)?;

    println!("{} {}", "Layout:".bold(), model.layout.to_string().cyan());

    match model.layout {
        LayoutKind::Flat => {
            println!("{}", "Classes:".bold());
            for folder in model.classes.values() {
                println!("  {:30} {:5} image(s)", folder.name, folder.images.len());
            }
        }
        LayoutKind::SplitPreexisting => {
            for (split_name, classes) in &model.splits {
                println!("{} {}", "Split:".bold(), split_name);
                for folder in classes.values() {
                    println!("  {:30} {:5} image(s)", folder.name, folder.images.len());
                }
            }
            for (split_name, missing) in model.missing_classes() {
                let names: Vec<_> = missing.into_iter().collect();
                println!(
                    "  {} split '{}' is missing: {}",
                    "note:".yellow(),
                    split_name,
                    names.join(", ")
                );
            }
        }
        LayoutKind::Unrecognized => {
            println!("  {}", "not a recognizable image dataset".yellow());
        }
    }

    for skipped in &model.skipped {
        println!(
            "  {} skipped '{}' ({:?})",
            "note:".yellow(),
            skipped.name,
            skipped.reason
        );
    }

    println!(
        "{} metadata: {}, labels: {}",
        "Auxiliary files:".bold(),
        model.has_metadata,
        model.has_labels
    );

    if tree {
        println!("\n{}", render_tree(path)?);
    }

    Ok(())
}

struct SplitArgs {
    path: PathBuf,
    names: SplitNames,
    ratios: String,
    seed: u64,
    mode: String,
    dest: Option<PathBuf>,
    strict: bool,
    allow_resplit: bool,
    overwrite: bool,
    dry_run: bool,
    plan_out: Option<PathBuf>,
}

fn cmd_split(args: SplitArgs) -> Result<()> {
    let ratios = parse_ratios(&args.ratios)?;
    let mode = parse_mode(&args.mode)?;

    let options = ClassifyOptions {
        strictness: strictness_of(args.strict),
    };
    let model = classify(&args.path, &options)?;

    let spec = SplitSpec {
        ratios,
        seed: args.seed,
        names: args.names,
        allow_resplit: args.allow_resplit,
    };
    let split_plan = plan(&model, &spec)?;

    if let Some(plan_path) = &args.plan_out {
        split_plan.save(plan_path)?;
        println!("{} plan written to {}", "Plan:".bold(), plan_path.display());
    }

    if args.dry_run {
        println!("{}", "Dry run - no files will be written".yellow().bold());
        for (class, assignment) in &split_plan.classes {
            println!(
                "  {:30} {:5} {} / {:5} {} / {:5} {}",
                class,
                assignment.train.len(),
                spec.names.train,
                assignment.valid.len(),
                spec.names.valid,
                assignment.test.len(),
                spec.names.test
            );
        }
        println!("  {} file(s) total", split_plan.total_files());
        return Ok(());
    }

    let dest = args.dest.unwrap_or_else(|| default_dest(&args.path));
    let materialize_options = MaterializeOptions {
        mode,
        on_conflict: if args.overwrite {
            OnConflict::Overwrite
        } else {
            OnConflict::Fail
        },
        ..Default::default()
    };
    let report = materialize(&split_plan, &dest, &materialize_options)?;

    println!(
        "{} {} file(s) written to {}",
        "Done:".green().bold(),
        report.files_written,
        dest.display()
    );
    for (class, counts) in &report.classes {
        println!(
            "  {:30} {:5} / {:5} / {:5}",
            class, counts.train, counts.valid, counts.test
        );
    }

    Ok(())
}

fn cmd_apply(plan_path: &Path, dest: &Path, mode: &str, overwrite: bool) -> Result<()> {
    let split_plan = SplitPlan::load(plan_path)?;
    let options = MaterializeOptions {
        mode: parse_mode(mode)?,
        on_conflict: if overwrite {
            OnConflict::Overwrite
        } else {
            OnConflict::Fail
        },
        ..Default::default()
    };
    let report = materialize(&split_plan, dest, &options)?;

    println!(
        "{} {} file(s) written to {}",
        "Done:".green().bold(),
        report.files_written,
        dest.display()
    );

    Ok(())
}

/// Parse "a,b,c" into validated ratios.
fn parse_ratios(s: &str) -> Result<SplitRatios> {
    let parts: Vec<f64> = s
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<std::result::Result<_, _>>()
        .map_err(|_| LasplitError::InvalidRatio(format!("could not parse '{}'", s)))?;

    if parts.len() != 3 {
        return Err(LasplitError::InvalidRatio(format!(
            "expected three comma-separated values, got '{}'",
            s
        )));
    }

    SplitRatios::new(parts[0], parts[1], parts[2])
}

fn parse_mode(s: &str) -> Result<MaterializeMode> {
    match s.to_lowercase().as_str() {
        "copy" => Ok(MaterializeMode::Copy),
        "move" => Ok(MaterializeMode::Move),
        other => Err(LasplitError::InvalidArgument(format!(
            "unknown mode '{}' - expected 'copy' or 'move'",
            other
        ))),
    }
}

fn default_dest(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "dataset".to_string());
    path.with_file_name(format!("{}_split", name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ratios() {
        let r = parse_ratios("0.6,0.2,0.2").unwrap();
        assert_eq!(r.train, 0.6);
        assert!(parse_ratios("0.6,0.2").is_err());
        assert!(parse_ratios("a,b,c").is_err());
        assert!(parse_ratios("0.5,0.2,0.2").is_err());
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("copy").unwrap(), MaterializeMode::Copy);
        assert_eq!(parse_mode("MOVE").unwrap(), MaterializeMode::Move);
        assert!(parse_mode("link").is_err());
    }

    #[test]
    fn test_default_dest() {
        assert_eq!(
            default_dest(Path::new("/data/flowers")),
            PathBuf::from("/data/flowers_split")
        );
    }

    #[test]
    fn test_log_config_for_flags() {
        use tracing::Level;
        assert_eq!(log_config_for(false, false).level, Level::INFO);
        assert_eq!(log_config_for(true, false).level, Level::DEBUG);
        assert_eq!(log_config_for(false, true).level, Level::ERROR);
    }

    #[test]
    fn test_plan_out_then_apply() {
        use std::fs::{self, File};
        use tempfile::TempDir;

        let src = TempDir::new().unwrap();
        for (class, n) in [("cat", 5), ("dog", 4)] {
            let dir = src.path().join(class);
            fs::create_dir_all(&dir).unwrap();
            for i in 0..n {
                File::create(dir.join(format!("{}.jpg", i))).unwrap();
            }
        }

        // Dry run writes the plan but touches nothing else.
        let out = TempDir::new().unwrap();
        let plan_path = out.path().join("plan.json");
        cmd_split(SplitArgs {
            path: src.path().to_path_buf(),
            names: SplitNames::default(),
            ratios: "0.6,0.2,0.2".to_string(),
            seed: 1,
            mode: "copy".to_string(),
            dest: None,
            strict: false,
            allow_resplit: false,
            overwrite: false,
            dry_run: true,
            plan_out: Some(plan_path.clone()),
        })
        .unwrap();
        assert!(plan_path.exists());

        // Applying the saved plan materializes the same assignment.
        let dest = out.path().join("materialized");
        cmd_apply(&plan_path, &dest, "copy", false).unwrap();
        assert!(dest.join("train/cat").is_dir());
        assert!(src.path().join("cat/0.jpg").exists());

        let loaded = SplitPlan::load(&plan_path).unwrap();
        assert_eq!(loaded.classes["cat"].total(), 5);
    }

    #[test]
    fn test_exit_codes_distinct() {
        assert_eq!(
            exit_code_for(&LasplitError::NotFound(PathBuf::from("x"))),
            EXIT_INVALID_PATH
        );
        assert_eq!(
            exit_code_for(&LasplitError::UnsupportedLayout("x".into())),
            EXIT_UNRECOGNIZED
        );
        assert_eq!(
            exit_code_for(&LasplitError::InvalidRatio("x".into())),
            EXIT_INVALID_RATIOS
        );
        assert_eq!(
            exit_code_for(&LasplitError::DestinationConflict {
                count: 1,
                first: PathBuf::from("x")
            }),
            EXIT_CONFLICT
        );
    }
}
