//! Per-object annotation XML (GC10-DET layout) to a train/val/test YOLO tree.
//!
//! Images are discovered recursively, sorted, and partitioned with a seeded
//! shuffle. Each image's sibling `.xml` supplies the image size and the
//! objects; boxes are normalized to center/size form and written one line
//! per object next to a byte-for-byte copy of the image.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::report::{ConversionIssue, ConversionIssueCode, ConversionReport};
use crate::error::DefectPrepError;
use crate::ir::io_voc_xml::{annotation_path_for, read_annotation_file, AnnotationDocument};
use crate::ir::io_yolo::{render_label_lines, write_data_yaml, YoloLayout};
use crate::ir::{BBoxXYXY, ClassVocabulary, LabelLine, Pixel};
use crate::progress::create_progress_bar;
use crate::split::{partition, Split, SplitRatios, DEFAULT_SEED};
use crate::walk::{collect_files_with_extensions, rel_string};

/// What to do with boxes that are non-finite, inverted, empty, or reach
/// outside the image.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum BoxPolicy {
    /// Normalize the coordinates as written.
    #[default]
    PassThrough,
    /// Clamp each edge into the image before normalizing.
    Clamp,
    /// Abort the run.
    Reject,
}

/// Bounding-box converter configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BBoxConvertConfig {
    /// Source root holding images and their sibling `.xml` documents.
    pub input: PathBuf,
    /// Output root for `images/<split>` and `labels/<split>`.
    pub output: PathBuf,
    #[serde(default = "ClassVocabulary::gc10_det")]
    pub classes: ClassVocabulary,
    #[serde(default = "default_image_extensions")]
    pub image_extensions: Vec<String>,
    #[serde(default)]
    pub ratios: SplitRatios,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub box_policy: BoxPolicy,
    /// Delete the output root before writing.
    #[serde(default)]
    pub clean_output: bool,
}

fn default_image_extensions() -> Vec<String> {
    vec!["jpg".to_string()]
}

fn default_seed() -> u64 {
    DEFAULT_SEED
}

impl BBoxConvertConfig {
    /// GC10-DET defaults for the given source and output roots.
    pub fn new(input: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output: output.into(),
            classes: ClassVocabulary::gc10_det(),
            image_extensions: default_image_extensions(),
            ratios: SplitRatios::default(),
            seed: DEFAULT_SEED,
            box_policy: BoxPolicy::default(),
            clean_output: false,
        }
    }

    pub fn validate(&self) -> Result<(), DefectPrepError> {
        self.ratios.validate()?;
        if self.image_extensions.is_empty() {
            return Err(DefectPrepError::InvalidConfig {
                message: "at least one image extension is required".to_string(),
            });
        }
        if !self.input.is_dir() {
            return Err(DefectPrepError::InvalidConfig {
                message: format!("input directory not found: {}", self.input.display()),
            });
        }
        Ok(())
    }
}

struct PlannedSample<'a> {
    split: Split,
    image: &'a Path,
    lines: Vec<LabelLine>,
}

/// Runs the conversion.
///
/// Every annotation document is parsed before anything is written, so an
/// unknown class name or a rejected box aborts with no output produced.
pub fn convert_bbox_dataset(config: &BBoxConvertConfig) -> Result<ConversionReport, DefectPrepError> {
    config.validate()?;

    let subsets: Vec<&str> = Split::ALL.iter().map(|split| split.dir_name()).collect();
    let mut report = ConversionReport::new("convert-bbox", &config.output, &subsets);

    let images = collect_files_with_extensions(&config.input, &config.image_extensions)?;
    info!("Found {} images in {}", images.len(), config.input.display());
    report.discovered = images.len();

    let assignment = partition(images, &config.ratios, config.seed);
    for split in Split::ALL {
        info!("{split}: {} images assigned", assignment.get(split).len());
    }

    let mut planned = Vec::with_capacity(assignment.len());
    let mut seen_stems: HashSet<(Split, &OsStr)> = HashSet::new();

    for (split, image) in assignment.iter() {
        let xml_path = annotation_path_for(image);
        if !xml_path.is_file() {
            warn!("Missing XML: {}", xml_path.display());
            report.add(ConversionIssue::warning(
                ConversionIssueCode::MissingAnnotation,
                format!(
                    "no annotation for {}; image skipped",
                    rel_string(&config.input, image)
                ),
            ));
            continue;
        }

        // Images and labels are keyed by stem in the output tree.
        let stem = image.file_stem().unwrap_or_default();
        if !seen_stems.insert((split, stem)) {
            warn!(
                "{} shares its file stem with another {split} image; skipped",
                image.display()
            );
            report.add(ConversionIssue::warning(
                ConversionIssueCode::DuplicateFileName,
                format!(
                    "{} skipped: an earlier {split} image has the same file stem",
                    rel_string(&config.input, image)
                ),
            ));
            continue;
        }

        let document = read_annotation_file(&xml_path)?;
        let lines = label_lines_for(
            &document,
            &config.classes,
            config.box_policy,
            &xml_path,
            &mut report,
        )?;

        planned.push(PlannedSample {
            split,
            image: image.as_path(),
            lines,
        });
    }

    let layout = YoloLayout::new(&config.output);
    layout.prepare(&subsets, config.clean_output)?;

    let pb = create_progress_bar(planned.len() as u64, "convert-bbox");
    for sample in &planned {
        layout.write_sample(
            sample.split.dir_name(),
            sample.image,
            &render_label_lines(&sample.lines),
        )?;
        report.record_sample(
            sample.split.dir_name(),
            sample
                .lines
                .iter()
                .filter_map(|line| config.classes.name(line.class_id)),
        );
        pb.inc(1);
    }
    pb.finish_and_clear();

    write_data_yaml(&layout, &config.classes, &subsets)?;

    info!("Conversion completed; YOLO dataset saved to {}", config.output.display());
    Ok(report)
}

/// Turns every object of a document into a label line.
///
/// A class name outside the vocabulary is an error.
pub fn label_lines_for(
    document: &AnnotationDocument,
    vocab: &ClassVocabulary,
    policy: BoxPolicy,
    path: &Path,
    report: &mut ConversionReport,
) -> Result<Vec<LabelLine>, DefectPrepError> {
    let width = f64::from(document.width);
    let height = f64::from(document.height);

    let mut lines = Vec::with_capacity(document.objects.len());
    for object in &document.objects {
        let class_id = vocab
            .index_of(&object.name)
            .ok_or_else(|| DefectPrepError::UnknownClass {
                path: path.to_path_buf(),
                name: object.name.clone(),
            })?;

        let well_formed = object.bbox.is_finite()
            && object.bbox.is_ordered()
            && object.bbox.is_within(width, height);

        let bbox = match policy {
            BoxPolicy::PassThrough => object.bbox,
            _ if well_formed => object.bbox,
            BoxPolicy::Clamp if !object.bbox.is_finite() => {
                return Err(DefectPrepError::InvalidBox {
                    path: path.to_path_buf(),
                    message: format!(
                        "{:?} for '{}' has non-finite coordinates and cannot be clamped",
                        object.bbox, object.name
                    ),
                });
            }
            BoxPolicy::Clamp => {
                let b = &object.bbox;
                let ordered = BBoxXYXY::<Pixel>::from_xyxy(
                    b.xmin.min(b.xmax),
                    b.ymin.min(b.ymax),
                    b.xmin.max(b.xmax),
                    b.ymin.max(b.ymax),
                );
                report.add(ConversionIssue::info(
                    ConversionIssueCode::BoxClamped,
                    format!(
                        "clamped {:?} for '{}' in {} to {}x{}",
                        object.bbox,
                        object.name,
                        path.display(),
                        document.width,
                        document.height
                    ),
                ));
                ordered.clamp_to(width, height)
            }
            BoxPolicy::Reject => {
                return Err(DefectPrepError::InvalidBox {
                    path: path.to_path_buf(),
                    message: format!(
                        "{:?} for '{}' is not a non-empty box inside {}x{}",
                        object.bbox, object.name, document.width, document.height
                    ),
                });
            }
        };

        lines.push(LabelLine::from_pixel_box(class_id, &bbox, width, height));
    }

    Ok(lines)
}
