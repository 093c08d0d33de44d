//! Shared representation for the dataset converters.
//!
//! Annotation documents are read into pixel-space boxes, and label files are
//! written from normalized center/size lines. The coordinate space is part of
//! the box type, so the two cannot be mixed up.
//!
//! # Example
//!
//! ```
//! use defectprep::ir::{BBoxXYXY, ClassVocabulary, LabelLine, Pixel};
//!
//! let vocab = ClassVocabulary::gc10_det();
//! let class_id = vocab.index_of("inclusion").unwrap();
//! let bbox = BBoxXYXY::<Pixel>::from_xyxy(50.0, 20.0, 150.0, 80.0);
//! let line = LabelLine::from_pixel_box(class_id, &bbox, 200.0, 100.0);
//! assert_eq!(line.to_string(), "6 0.5 0.5 0.5 0.6");
//! ```

mod bbox;
pub mod io_voc_xml;
pub mod io_yolo;
mod label;
mod vocab;

pub use bbox::{BBoxXYXY, Normalized, Pixel};
pub use label::{format_coordinate, LabelLine};
#[cfg(any(test, feature = "fuzzing"))]
pub use label::parse_label_line;
#[cfg(feature = "fuzzing")]
pub use label::fuzz_parse_label_line;
pub use vocab::{ClassId, ClassVocabulary, GC10_DET_CLASSES, NEU_DET_CLASSES};
