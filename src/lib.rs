//! defectprep: dataset preparation for metal-surface defect detection.
//!
//! Three independent jobs turn the raw NEU-DET and GC10-DET datasets into
//! something a YOLO trainer can consume:
//!
//! - `scan` inventories image dimensions, color modes, class balance and
//!   unreadable files, and writes one JSON summary.
//! - `convert-bbox` turns per-object annotation XML into normalized YOLO
//!   labels with a seeded train/val/test split.
//! - `convert-whole-image` labels every image of a class-folder dataset
//!   with one box covering the whole frame.
//!
//! # Modules
//!
//! - [`ir`]: boxes, class vocabularies, label lines, annotation and YOLO I/O
//! - [`scan`]: the dataset scanner
//! - [`convert`]: the two converters and their report
//! - [`split`]: seeded train/val/test partitioning
//! - [`error`]: error types for defectprep operations

pub mod config;
pub mod convert;
pub mod error;
pub mod ir;
pub mod progress;
pub mod scan;
pub mod split;
pub mod walk;

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use convert::bbox::{convert_bbox_dataset, BBoxConvertConfig, BoxPolicy};
use convert::whole_image::{convert_whole_image_dataset, WholeImageConvertConfig};
use convert::ConversionReport;
use ir::ClassVocabulary;
use scan::{run_scan, ScanConfig};

pub use error::DefectPrepError;

/// The defectprep CLI application.
#[derive(Parser)]
#[command(name = "defectprep")]
#[command(version, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Inventory image dimensions, color modes, classes and corrupt files.
    Scan(ScanArgs),
    /// Convert per-object annotation XML into a train/val/test YOLO dataset.
    ConvertBbox(ConvertBboxArgs),
    /// Label class-folder images with one full-frame YOLO box each.
    ConvertWholeImage(ConvertWholeImageArgs),
}

/// How a run summary is printed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum ReportFormat {
    #[default]
    Text,
    Json,
}

/// Arguments for the scan subcommand.
#[derive(clap::Args)]
struct ScanArgs {
    /// Data root holding raw/neu_det and raw/gc10_det.
    #[arg(long, default_value = "data")]
    data_dir: PathBuf,

    /// YAML scan configuration; replaces the stock dataset layout.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Where to write the JSON summary.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Terminal summary format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

/// Arguments for the convert-bbox subcommand.
#[derive(clap::Args)]
struct ConvertBboxArgs {
    /// Source root with images and sibling .xml annotations.
    #[arg(long, required_unless_present = "config")]
    input: Option<PathBuf>,

    /// Output root for the YOLO dataset.
    #[arg(long, required_unless_present = "config")]
    output: Option<PathBuf>,

    /// YAML converter configuration; flags given alongside override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ordered class names (comma-separated). Defaults to the GC10-DET classes.
    #[arg(long, value_delimiter = ',')]
    classes: Option<Vec<String>>,

    /// Image extensions to pick up (comma-separated, case-insensitive).
    #[arg(long, value_delimiter = ',')]
    extensions: Option<Vec<String>>,

    /// Shuffle seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Share of images for the train split (default 0.7).
    #[arg(long)]
    train_ratio: Option<f64>,

    /// Share of images for the val split (default 0.15).
    #[arg(long)]
    val_ratio: Option<f64>,

    /// Share of images for the test split (default 0.15). The three ratios must sum to 1.
    #[arg(long)]
    test_ratio: Option<f64>,

    /// Handling of boxes that are inverted, empty or outside the image.
    #[arg(long, value_enum)]
    box_policy: Option<BoxPolicy>,

    /// Delete the output root before writing.
    #[arg(long)]
    clean: bool,

    /// Terminal summary format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

/// Arguments for the convert-whole-image subcommand.
#[derive(clap::Args)]
struct ConvertWholeImageArgs {
    /// Training root with one folder per class.
    #[arg(long, required_unless_present = "config")]
    train_root: Option<PathBuf>,

    /// Validation root with one folder per class.
    #[arg(long, required_unless_present = "config")]
    val_root: Option<PathBuf>,

    /// Output root; deleted and recreated.
    #[arg(long, required_unless_present = "config")]
    output: Option<PathBuf>,

    /// YAML converter configuration; flags given alongside override it.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ordered class names (comma-separated). Defaults to the NEU-DET classes.
    #[arg(long, value_delimiter = ',')]
    classes: Option<Vec<String>>,

    /// Image file-name suffix, matched exactly.
    #[arg(long)]
    extension: Option<String>,

    /// Terminal summary format.
    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    report: ReportFormat,
}

/// Run the defectprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), DefectPrepError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Scan(args)) => run_scan_command(args),
        Some(Commands::ConvertBbox(args)) => run_convert_bbox(args),
        Some(Commands::ConvertWholeImage(args)) => run_convert_whole_image(args),
        None => {
            println!("defectprep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Dataset preparation for metal-surface defect detection.");
            println!();
            println!("Run 'defectprep --help' for usage information.");
            Ok(())
        }
    }
}

fn run_scan_command(args: ScanArgs) -> Result<(), DefectPrepError> {
    let mut config = match &args.config {
        Some(path) => config::load_yaml::<ScanConfig>(path)?,
        None => ScanConfig::default_for(&args.data_dir),
    };
    if let Some(output) = args.output {
        config.output = output;
    }

    let report = run_scan(&config)?;

    match args.report {
        ReportFormat::Json => print_json(&report)?,
        ReportFormat::Text => {
            print!("{report}");
            println!();
            println!("Summary written to {}", config.output.display());
        }
    }
    Ok(())
}

fn run_convert_bbox(args: ConvertBboxArgs) -> Result<(), DefectPrepError> {
    let mut config = match &args.config {
        Some(path) => config::load_yaml::<BBoxConvertConfig>(path)?,
        None => BBoxConvertConfig::new(
            required(args.input.clone(), "--input")?,
            required(args.output.clone(), "--output")?,
        ),
    };

    if let Some(input) = args.input {
        config.input = input;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(classes) = args.classes {
        config.classes = ClassVocabulary::new(classes)?;
    }
    if let Some(extensions) = args.extensions {
        config.image_extensions = extensions;
    }
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    if let Some(train) = args.train_ratio {
        config.ratios.train = train;
    }
    if let Some(val) = args.val_ratio {
        config.ratios.val = val;
    }
    if let Some(test) = args.test_ratio {
        config.ratios.test = test;
    }
    if let Some(policy) = args.box_policy {
        config.box_policy = policy;
    }
    config.clean_output |= args.clean;

    let report = convert_bbox_dataset(&config)?;
    print_conversion_report(&report, args.report)
}

fn run_convert_whole_image(args: ConvertWholeImageArgs) -> Result<(), DefectPrepError> {
    let mut config = match &args.config {
        Some(path) => config::load_yaml::<WholeImageConvertConfig>(path)?,
        None => WholeImageConvertConfig::new(
            required(args.train_root.clone(), "--train-root")?,
            required(args.val_root.clone(), "--val-root")?,
            required(args.output.clone(), "--output")?,
        ),
    };

    if let Some(train_root) = args.train_root {
        config.train_root = train_root;
    }
    if let Some(val_root) = args.val_root {
        config.val_root = val_root;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(classes) = args.classes {
        config.classes = ClassVocabulary::new(classes)?;
    }
    if let Some(extension) = args.extension {
        config.extension = extension;
    }

    let report = convert_whole_image_dataset(&config)?;
    print_conversion_report(&report, args.report)
}

fn required(value: Option<PathBuf>, flag: &str) -> Result<PathBuf, DefectPrepError> {
    value.ok_or_else(|| DefectPrepError::InvalidConfig {
        message: format!("{flag} is required without --config"),
    })
}

fn print_conversion_report(
    report: &ConversionReport,
    format: ReportFormat,
) -> Result<(), DefectPrepError> {
    match format {
        ReportFormat::Text => print!("{report}"),
        ReportFormat::Json => print_json(report)?,
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<(), DefectPrepError> {
    let text = serde_json::to_string_pretty(value).map_err(|source| {
        DefectPrepError::ReportWrite {
            path: PathBuf::from("<stdout>"),
            source,
        }
    })?;
    println!("{text}");
    Ok(())
}
