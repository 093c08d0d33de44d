//! Dataset converters that emit a YOLO detection tree.
//!
//! - [`bbox`]: per-object annotation XML, split into train/val/test.
//! - [`whole_image`]: class-folder images labeled with one full-frame box.

pub mod bbox;
mod report;
pub mod whole_image;

pub use report::{
    ConversionIssue, ConversionIssueCode, ConversionReport, ConversionSeverity, SubsetCounts,
};
