//! Scan summary types, JSON document layout and terminal formatting.

use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// Class identity of a scanned image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ClassKey {
    /// Integer id read from a companion label file.
    Id(i64),
    /// Name of the class folder the image sits in.
    Name(String),
}

impl fmt::Display for ClassKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassKey::Id(id) => write!(f, "{id}"),
            ClassKey::Name(name) => f.write_str(name),
        }
    }
}

/// Histogram key used for images whose class could not be determined.
pub const NULL_CLASS_KEY: &str = "null";

/// One successfully opened image.
#[derive(Clone, Debug, PartialEq)]
pub struct ImageRecord {
    pub path: PathBuf,
    pub class: Option<ClassKey>,
    pub width: u32,
    pub height: u32,
    pub mode: String,
}

/// An image that could not be opened, with the decoder's reason.
#[derive(Clone, Debug, PartialEq)]
pub struct CorruptImage {
    pub path: PathBuf,
    pub reason: String,
}

/// Aggregate statistics over the successfully opened images of a dataset.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetStats {
    pub num_images: usize,
    pub classes: BTreeMap<String, usize>,
    pub modes: BTreeMap<String, usize>,
    pub width_range: [u32; 2],
    pub height_range: [u32; 2],
}

/// Scan result for one dataset.
///
/// Serializes as `{"stats": {...}, "corrupt": [...]}`; `stats` is an empty
/// object when no image could be opened.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DatasetSummary {
    #[serde(skip)]
    pub name: String,
    #[serde(serialize_with = "serialize_stats")]
    pub stats: Option<DatasetStats>,
    #[serde(serialize_with = "serialize_corrupt")]
    pub corrupt: Vec<CorruptImage>,
}

impl DatasetSummary {
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stats: None,
            corrupt: Vec::new(),
        }
    }

    pub fn num_images(&self) -> usize {
        self.stats.as_ref().map_or(0, |stats| stats.num_images)
    }
}

fn serialize_stats<S: Serializer>(
    stats: &Option<DatasetStats>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match stats {
        Some(stats) => stats.serialize(serializer),
        None => serializer.serialize_map(Some(0))?.end(),
    }
}

#[allow(clippy::ptr_arg)]
fn serialize_corrupt<S: Serializer>(
    corrupt: &Vec<CorruptImage>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_seq(corrupt.iter().map(|entry| entry.path.to_string_lossy()))
}

/// The combined document: dataset name to summary, in scan order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ScanReport {
    pub datasets: Vec<DatasetSummary>,
}

impl Serialize for ScanReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.datasets.len()))?;
        for summary in &self.datasets {
            map.serialize_entry(&summary.name, summary)?;
        }
        map.end()
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for summary in &self.datasets {
            writeln!(f, "{}", summary.name)?;
            match &summary.stats {
                Some(stats) => {
                    writeln!(f, "  images:  {}", stats.num_images)?;
                    writeln!(
                        f,
                        "  width:   {}..{}",
                        stats.width_range[0], stats.width_range[1]
                    )?;
                    writeln!(
                        f,
                        "  height:  {}..{}",
                        stats.height_range[0], stats.height_range[1]
                    )?;
                    writeln!(f, "  classes: {}", stats.classes.len())?;
                    let modes: Vec<String> = stats
                        .modes
                        .iter()
                        .map(|(mode, count)| format!("{mode}={count}"))
                        .collect();
                    writeln!(f, "  modes:   {}", modes.join(", "))?;
                }
                None => writeln!(f, "  images:  0")?,
            }
            writeln!(f, "  corrupt: {}", summary.corrupt.len())?;
        }
        Ok(())
    }
}
