//! Ultralytics-style YOLO output tree.
//!
//! Both converters write the same layout:
//!
//! ```text
//! <root>/images/<subset>/<stem>.<ext>
//! <root>/labels/<subset>/<stem>.txt
//! <root>/data.yaml
//! ```
//!
//! Images are copied byte for byte; label files hold one [`LabelLine`] per
//! object.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::{ClassVocabulary, LabelLine};
use crate::error::DefectPrepError;

pub const LABEL_EXTENSION: &str = "txt";
pub const DATA_YAML: &str = "data.yaml";

/// The output root of a converted dataset.
#[derive(Clone, Debug)]
pub struct YoloLayout {
    root: PathBuf,
}

impl YoloLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn images_dir(&self, subset: &str) -> PathBuf {
        self.root.join("images").join(subset)
    }

    pub fn labels_dir(&self, subset: &str) -> PathBuf {
        self.root.join("labels").join(subset)
    }

    /// Creates `images/<subset>` and `labels/<subset>` for every subset.
    ///
    /// With `clean`, the whole root is deleted first. Anything under it that
    /// the current source tree cannot regenerate is lost.
    pub fn prepare(&self, subsets: &[&str], clean: bool) -> Result<(), DefectPrepError> {
        if clean && self.root.exists() {
            log::warn!(
                "Output directory {} already exists; deleting and recreating it.",
                self.root.display()
            );
            fs::remove_dir_all(&self.root).map_err(DefectPrepError::io_at(&self.root))?;
        }

        for subset in subsets {
            let images = self.images_dir(subset);
            let labels = self.labels_dir(subset);
            fs::create_dir_all(&images).map_err(DefectPrepError::io_at(&images))?;
            fs::create_dir_all(&labels).map_err(DefectPrepError::io_at(&labels))?;
        }

        Ok(())
    }

    /// Copies the image unmodified into `images/<subset>/` and writes
    /// `contents` as its label file into `labels/<subset>/`. Returns the
    /// label path.
    pub fn write_sample(
        &self,
        subset: &str,
        image_path: &Path,
        contents: &str,
    ) -> Result<PathBuf, DefectPrepError> {
        let file_name = image_path
            .file_name()
            .ok_or_else(|| DefectPrepError::InvalidConfig {
                message: format!("image path '{}' has no file name", image_path.display()),
            })?;

        let image_dest = self.images_dir(subset).join(file_name);
        fs::copy(image_path, &image_dest).map_err(DefectPrepError::io_at(image_path))?;

        let label_path = self.labels_dir(subset).join(label_file_name(image_path));
        fs::write(&label_path, contents).map_err(DefectPrepError::io_at(&label_path))?;
        Ok(label_path)
    }
}

/// `<stem>.txt` for an image path.
pub fn label_file_name(image_path: &Path) -> PathBuf {
    let mut name = image_path.file_stem().unwrap_or_default().to_os_string();
    name.push(".");
    name.push(LABEL_EXTENSION);
    PathBuf::from(name)
}

/// Renders label lines joined by `\n`, coordinates as in
/// [`format_coordinate`](super::format_coordinate).
///
/// No lines produces an empty string, which is the valid "no objects" label.
pub fn render_label_lines(lines: &[LabelLine]) -> String {
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Writes `data.yaml` naming the class vocabulary and the image directory of
/// each subset, relative to the output root.
pub fn write_data_yaml(
    layout: &YoloLayout,
    vocab: &ClassVocabulary,
    subsets: &[&str],
) -> Result<(), DefectPrepError> {
    let mut yaml = String::new();
    yaml.push_str(&format!(
        "path: {}\n",
        yaml_single_quoted(&layout.root().to_string_lossy())
    ));
    for subset in subsets {
        yaml.push_str(&format!("{subset}: images/{subset}\n"));
    }
    yaml.push_str(&format!("nc: {}\n", vocab.len()));
    yaml.push_str("names:\n");
    for (id, name) in vocab.iter() {
        yaml.push_str(&format!("  {}: {}\n", id, yaml_single_quoted(name)));
    }

    let path = layout.root().join(DATA_YAML);
    fs::write(&path, yaml).map_err(DefectPrepError::io_at(&path))
}

fn yaml_single_quoted(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

#[derive(Debug, Deserialize)]
struct DataYaml {
    names: std::collections::BTreeMap<usize, String>,
}

/// Reads the class names back out of a `data.yaml`, in id order.
pub fn read_data_yaml_names(path: &Path) -> Result<Vec<String>, DefectPrepError> {
    let data = fs::read_to_string(path).map_err(DefectPrepError::io_at(path))?;
    let parsed: DataYaml =
        serde_yaml::from_str(&data).map_err(|source| DefectPrepError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
    Ok(parsed.names.into_values().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::ClassId;

    #[test]
    fn label_file_name_uses_stem() {
        assert_eq!(
            label_file_name(Path::new("/raw/crazing/crazing_1.jpg")),
            PathBuf::from("crazing_1.txt")
        );
        assert_eq!(
            label_file_name(Path::new("img.v2.jpg")),
            PathBuf::from("img.v2.txt")
        );
    }

    #[test]
    fn render_joins_without_trailing_newline() {
        let lines = [
            LabelLine::full_frame(ClassId::new(0)),
            LabelLine::full_frame(ClassId::new(1)),
        ];
        assert_eq!(
            render_label_lines(&lines),
            "0 0.5 0.5 1.0 1.0\n1 0.5 0.5 1.0 1.0"
        );
        assert_eq!(render_label_lines(&[]), "");
    }

    #[test]
    fn prepare_creates_subset_dirs_and_cleans() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let layout = YoloLayout::new(temp.path().join("out"));
        fs::create_dir_all(layout.root().join("stale")).expect("mkdir");

        layout.prepare(&["train", "val"], false).expect("prepare");
        assert!(layout.images_dir("train").is_dir());
        assert!(layout.labels_dir("val").is_dir());
        assert!(layout.root().join("stale").is_dir());

        layout.prepare(&["train"], true).expect("prepare clean");
        assert!(!layout.root().join("stale").exists());
        assert!(!layout.images_dir("val").exists());
        assert!(layout.labels_dir("train").is_dir());
    }

    #[test]
    fn write_sample_copies_image_and_writes_label() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let src = temp.path().join("src/a.jpg");
        fs::create_dir_all(src.parent().unwrap()).expect("mkdir");
        fs::write(&src, b"jpeg-bytes").expect("write image");

        let layout = YoloLayout::new(temp.path().join("out"));
        layout.prepare(&["test"], false).expect("prepare");
        let label = layout
            .write_sample("test", &src, "")
            .expect("write sample");

        assert_eq!(label, layout.labels_dir("test").join("a.txt"));
        assert_eq!(fs::read_to_string(&label).expect("read label"), "");
        assert_eq!(
            fs::read(layout.images_dir("test").join("a.jpg")).expect("read copy"),
            b"jpeg-bytes"
        );
    }

    #[test]
    fn data_yaml_lists_vocabulary_in_order() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let layout = YoloLayout::new(temp.path());
        let vocab = ClassVocabulary::new(["crazing", "it's"]).expect("vocab");

        write_data_yaml(&layout, &vocab, &["train", "val"]).expect("write data.yaml");

        let text = fs::read_to_string(temp.path().join(DATA_YAML)).expect("read");
        assert!(text.contains("train: images/train\n"));
        assert!(text.contains("val: images/val\n"));
        assert!(text.contains("nc: 2\n"));

        let names = read_data_yaml_names(&temp.path().join(DATA_YAML)).expect("read names");
        assert_eq!(names, vec!["crazing", "it's"]);
    }
}
