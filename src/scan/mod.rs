//! Dataset inventory: dimensions, color modes, class histograms and corrupt files.
//!
//! Every image under a dataset root is opened far enough to read its header.
//! Images that cannot be opened are recorded as corrupt and left out of the
//! statistics; a single bad file never aborts the scan.

mod report;

pub use report::{
    ClassKey, CorruptImage, DatasetStats, DatasetSummary, ImageRecord, ScanReport, NULL_CLASS_KEY,
};

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};

use image::{ColorType, ImageDecoder, ImageReader};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::DefectPrepError;
use crate::progress::create_progress_bar;
use crate::walk::{has_extension, walk_files_with_extensions};

/// Where an image's class comes from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClassSource {
    /// `<labels_dir>/<stem>.txt`, first token of the first line is the class id.
    CompanionLabel { labels_dir: PathBuf },
    /// The name of the directory the image sits in.
    ParentDirectory,
}

/// One dataset to scan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DatasetScan {
    pub name: String,
    pub images_dir: PathBuf,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    pub class_source: ClassSource,
}

/// Scan job configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// The summary document is written here, replacing any previous file.
    pub output: PathBuf,
    pub datasets: Vec<DatasetScan>,
}

fn default_extensions() -> Vec<String> {
    ["jpg", "png", "jpeg", "bmp"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl ScanConfig {
    /// The stock NEU-DET + GC10-DET layout under `data_dir`.
    pub fn default_for(data_dir: &Path) -> Self {
        let neu_root = data_dir.join("raw").join("neu_det");
        Self {
            output: data_dir.join("dataset_info.json"),
            datasets: vec![
                DatasetScan {
                    name: "NEU-DET".to_string(),
                    images_dir: neu_root.join("images"),
                    extensions: default_extensions(),
                    class_source: ClassSource::CompanionLabel {
                        labels_dir: neu_root.join("annotations"),
                    },
                },
                DatasetScan {
                    name: "GC10-DET".to_string(),
                    images_dir: data_dir.join("raw").join("gc10_det"),
                    extensions: ["jpg", "png", "bmp"]
                        .into_iter()
                        .map(String::from)
                        .collect(),
                    class_source: ClassSource::ParentDirectory,
                },
            ],
        }
    }
}

/// Scans every configured dataset and writes the combined summary document.
pub fn run_scan(config: &ScanConfig) -> Result<ScanReport, DefectPrepError> {
    let mut report = ScanReport::default();
    for dataset in &config.datasets {
        report.datasets.push(scan_dataset(dataset)?);
    }

    write_scan_report(&config.output, &report)?;
    info!("Dataset summary saved to {}", config.output.display());
    Ok(report)
}

/// Scans a single dataset root.
///
/// A missing root is logged and produces an empty summary.
pub fn scan_dataset(dataset: &DatasetScan) -> Result<DatasetSummary, DefectPrepError> {
    if !dataset.images_dir.is_dir() {
        error!(
            "[{}] images directory not found: {}",
            dataset.name,
            dataset.images_dir.display()
        );
        return Ok(DatasetSummary::empty(&dataset.name));
    }

    let (image_paths, walk_errors) =
        walk_files_with_extensions(&dataset.images_dir, &dataset.extensions);
    info!("[{}] Found {} images", dataset.name, image_paths.len());

    let mut corrupt = Vec::new();
    for err in walk_errors {
        match err.path() {
            Some(path) if has_extension(path, &dataset.extensions) => corrupt.push(CorruptImage {
                path: path.to_path_buf(),
                reason: err.to_string(),
            }),
            _ => warn!("[{}] skipping unreadable entry: {err}", dataset.name),
        }
    }

    let pb = create_progress_bar(image_paths.len() as u64, &dataset.name);
    let mut records = Vec::with_capacity(image_paths.len());

    for path in &image_paths {
        match scan_image(path, &dataset.class_source) {
            Ok(record) => records.push(record),
            Err(bad) => {
                log::debug!("[{}] corrupt image {}: {}", dataset.name, bad.path.display(), bad.reason);
                corrupt.push(bad);
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    if !corrupt.is_empty() {
        warn!("[{}] {} corrupt image(s)", dataset.name, corrupt.len());
    }

    Ok(DatasetSummary {
        name: dataset.name.clone(),
        stats: summarize(&records),
        corrupt,
    })
}

/// Opens one image and resolves its class.
pub fn scan_image(path: &Path, class_source: &ClassSource) -> Result<ImageRecord, CorruptImage> {
    let (width, height, color) = probe_image(path).map_err(|reason| CorruptImage {
        path: path.to_path_buf(),
        reason,
    })?;
    let mode = if is_indexed_png(path) {
        PALETTE_MODE.to_string()
    } else {
        color_mode_name(color)
    };

    let class = match class_source {
        ClassSource::CompanionLabel { labels_dir } => {
            companion_label_path(labels_dir, path)
                .and_then(|label| read_companion_class_id(&label))
                .map(ClassKey::Id)
        }
        ClassSource::ParentDirectory => path
            .parent()
            .and_then(|parent| parent.file_name())
            .map(|name| ClassKey::Name(name.to_string_lossy().into_owned())),
    };

    Ok(ImageRecord {
        path: path.to_path_buf(),
        class,
        width,
        height,
        mode,
    })
}

/// Reads dimensions and color type from the image header without decoding pixels.
fn probe_image(path: &Path) -> Result<(u32, u32, ColorType), String> {
    let decoder = ImageReader::open(path)
        .map_err(|err| err.to_string())?
        .with_guessed_format()
        .map_err(|err| err.to_string())?
        .into_decoder()
        .map_err(|err| err.to_string())?;

    let (width, height) = decoder.dimensions();
    Ok((width, height, decoder.color_type()))
}

const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";
/// IHDR color type for palette images.
const PNG_INDEXED_COLOR: u8 = 3;
const PALETTE_MODE: &str = "P";

/// Whether `path` is a PNG whose header declares a palette.
///
/// Decoders expand palettes to RGB(A), so the header is checked directly.
fn is_indexed_png(path: &Path) -> bool {
    let Ok(file) = fs::File::open(path) else {
        return false;
    };
    let mut header = Vec::with_capacity(26);
    if file.take(26).read_to_end(&mut header).is_err() {
        return false;
    }
    png_header_is_indexed(&header)
}

/// Signature, IHDR length and tag, then width, height, bit depth, color type.
pub fn png_header_is_indexed(header: &[u8]) -> bool {
    header.len() >= 26
        && header.starts_with(PNG_SIGNATURE)
        && &header[12..16] == b"IHDR"
        && header[25] == PNG_INDEXED_COLOR
}

fn companion_label_path(labels_dir: &Path, image_path: &Path) -> Option<PathBuf> {
    let stem = image_path.file_stem()?;
    let mut name = stem.to_os_string();
    name.push(".txt");
    Some(labels_dir.join(name))
}

/// First whitespace-separated token of the first line, as an integer.
///
/// Any failure (missing file, unreadable, empty, not an integer) yields `None`.
pub fn read_companion_class_id(label_path: &Path) -> Option<i64> {
    let file = fs::File::open(label_path).ok()?;
    let mut first_line = String::new();
    BufReader::new(file).read_line(&mut first_line).ok()?;
    first_line.split_whitespace().next()?.parse::<i64>().ok()
}

/// Short mode names for decoder color types (`L`, `RGB`, `I;16`, ...).
pub fn color_mode_name(color: ColorType) -> String {
    match color {
        ColorType::L8 => "L",
        ColorType::La8 => "LA",
        ColorType::Rgb8 => "RGB",
        ColorType::Rgba8 => "RGBA",
        ColorType::L16 => "I;16",
        ColorType::La16 => "LA;16",
        ColorType::Rgb16 => "RGB;16",
        ColorType::Rgba16 => "RGBA;16",
        ColorType::Rgb32F => "RGB;F32",
        ColorType::Rgba32F => "RGBA;F32",
        other => return format!("{other:?}"),
    }
    .to_string()
}

/// Aggregates opened images; `None` when there are none.
pub fn summarize(records: &[ImageRecord]) -> Option<DatasetStats> {
    let first = records.first()?;

    let mut classes: BTreeMap<String, usize> = BTreeMap::new();
    let mut modes: BTreeMap<String, usize> = BTreeMap::new();
    let mut width_range = [first.width, first.width];
    let mut height_range = [first.height, first.height];

    for record in records {
        let class_key = record
            .class
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_else(|| NULL_CLASS_KEY.to_string());
        *classes.entry(class_key).or_insert(0) += 1;
        *modes.entry(record.mode.clone()).or_insert(0) += 1;

        width_range[0] = width_range[0].min(record.width);
        width_range[1] = width_range[1].max(record.width);
        height_range[0] = height_range[0].min(record.height);
        height_range[1] = height_range[1].max(record.height);
    }

    Some(DatasetStats {
        num_images: records.len(),
        classes,
        modes,
        width_range,
        height_range,
    })
}

/// Writes the report as 4-space-indented JSON, replacing any existing file.
pub fn write_scan_report(path: &Path, report: &ScanReport) -> Result<(), DefectPrepError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(DefectPrepError::io_at(parent))?;
    }

    let mut buf = Vec::new();
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
    report
        .serialize(&mut serializer)
        .map_err(|source| DefectPrepError::ReportWrite {
            path: path.to_path_buf(),
            source,
        })?;

    fs::write(path, buf).map_err(DefectPrepError::io_at(path))
}
