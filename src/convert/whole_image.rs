//! Class-folder classification data (NEU-DET layout) to YOLO detection labels.
//!
//! Each source root holds one directory per class. Every image becomes a
//! single object covering the whole frame, so a detector can be trained on
//! data that only carries image-level labels.

use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use log::{info, warn};
use serde::{Deserialize, Serialize};

use super::report::{ConversionIssue, ConversionIssueCode, ConversionReport};
use crate::error::DefectPrepError;
use crate::ir::io_yolo::{write_data_yaml, YoloLayout};
use crate::ir::{ClassId, ClassVocabulary, LabelLine};
use crate::progress::create_progress_bar;

/// Output subsets, in write order.
const SUBSETS: [&str; 2] = ["train", "val"];

/// Whole-image converter configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WholeImageConvertConfig {
    /// `<train_root>/<class>/*.jpg`
    pub train_root: PathBuf,
    /// `<val_root>/<class>/*.jpg`
    pub val_root: PathBuf,
    /// Destroyed and recreated on every run.
    pub output: PathBuf,
    #[serde(default = "ClassVocabulary::neu_det")]
    pub classes: ClassVocabulary,
    /// File-name suffix, matched exactly.
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    "jpg".to_string()
}

impl WholeImageConvertConfig {
    /// NEU-DET defaults for the given roots.
    pub fn new(
        train_root: impl Into<PathBuf>,
        val_root: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            train_root: train_root.into(),
            val_root: val_root.into(),
            output: output.into(),
            classes: ClassVocabulary::neu_det(),
            extension: default_extension(),
        }
    }

    fn source_for(&self, subset: &str) -> &Path {
        match subset {
            "train" => &self.train_root,
            _ => &self.val_root,
        }
    }
}

/// Name a subset is logged under.
fn display_name(subset: &str) -> &str {
    match subset {
        "val" => "validation",
        other => other,
    }
}

/// Lists `(image, class)` pairs under `root`, walking classes in vocabulary
/// order and files in name order.
///
/// A missing class folder contributes no images and is reported, not fatal.
pub fn collect_class_images(
    root: &Path,
    subset: &str,
    vocab: &ClassVocabulary,
    extension: &str,
    report: &mut ConversionReport,
) -> Result<Vec<(PathBuf, ClassId)>, DefectPrepError> {
    let mut images = Vec::new();

    for (class_id, name) in vocab.iter() {
        let class_dir = root.join(name);
        if !class_dir.is_dir() {
            warn!("Class folder {} does not exist", class_dir.display());
            report.add(ConversionIssue::warning(
                ConversionIssueCode::MissingClassFolder,
                format!(
                    "{} class folder '{}' not found under {}",
                    display_name(subset),
                    name,
                    root.display()
                ),
            ));
            continue;
        }

        let files = crate::walk::list_files_with_suffix(&class_dir, extension)?;
        info!("{} - {}: {} images", display_name(subset), name, files.len());
        images.extend(files.into_iter().map(|path| (path, class_id)));
    }

    Ok(images)
}

/// Runs the conversion for both subsets.
pub fn convert_whole_image_dataset(
    config: &WholeImageConvertConfig,
) -> Result<ConversionReport, DefectPrepError> {
    let mut report = ConversionReport::new("convert-whole-image", &config.output, &SUBSETS);

    let layout = YoloLayout::new(&config.output);
    layout.prepare(&SUBSETS, true)?;

    for subset in SUBSETS {
        let images = collect_class_images(
            config.source_for(subset),
            subset,
            &config.classes,
            &config.extension,
            &mut report,
        )?;
        report.discovered += images.len();

        let pb = create_progress_bar(images.len() as u64, display_name(subset));
        let mut seen_stems: HashSet<&OsStr> = HashSet::new();
        for (image, class_id) in &images {
            pb.inc(1);
            // Class folders are flattened into one subset directory.
            let stem = image.file_stem().unwrap_or_default();
            if !seen_stems.insert(stem) {
                warn!(
                    "{} shares its file stem with another {} image; skipped",
                    image.display(),
                    display_name(subset)
                );
                report.add(ConversionIssue::warning(
                    ConversionIssueCode::DuplicateFileName,
                    format!(
                        "{} skipped: an earlier {} image has the same file stem",
                        image.display(),
                        display_name(subset)
                    ),
                ));
                continue;
            }

            let label = format!("{}\n", LabelLine::full_frame(*class_id).to_compact_string());
            layout.write_sample(subset, image, &label)?;
            report.record_sample(subset, config.classes.name(*class_id));
        }
        pb.finish_and_clear();
    }

    write_data_yaml(&layout, &config.classes, &SUBSETS)?;

    info!(
        "Conversion complete: {} train and {} validation images written to {}",
        report.subset("train").map_or(0, |s| s.images),
        report.subset("val").map_or(0, |s| s.images),
        config.output.display()
    );
    Ok(report)
}
