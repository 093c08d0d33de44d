//! Conversion report: what was written where, and what was skipped.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

/// A summary of one converter run.
#[derive(Clone, Debug, Default, Serialize)]
pub struct ConversionReport {
    /// Converter name, as shown to the user.
    pub job: String,
    /// Output root.
    pub output: PathBuf,
    /// Images found in the source tree before any were skipped.
    pub discovered: usize,
    /// Written counts per output subset, in subset order.
    pub subsets: Vec<SubsetCounts>,
    /// Written objects per class name.
    pub classes: BTreeMap<String, usize>,
    pub issues: Vec<ConversionIssue>,
}

/// Counts written to one output subset.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SubsetCounts {
    pub name: String,
    pub images: usize,
    pub objects: usize,
}

impl ConversionReport {
    /// Creates an empty report listing `subsets` in order, all at zero.
    pub fn new(job: impl Into<String>, output: impl Into<PathBuf>, subsets: &[&str]) -> Self {
        Self {
            job: job.into(),
            output: output.into(),
            subsets: subsets
                .iter()
                .map(|name| SubsetCounts {
                    name: name.to_string(),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    /// Records one written image+label pair.
    pub fn record_sample<'a>(
        &mut self,
        subset: &str,
        class_names: impl IntoIterator<Item = &'a str>,
    ) {
        let index = match self.subsets.iter().position(|s| s.name == subset) {
            Some(index) => index,
            None => {
                self.subsets.push(SubsetCounts {
                    name: subset.to_string(),
                    ..Default::default()
                });
                self.subsets.len() - 1
            }
        };

        self.subsets[index].images += 1;
        for name in class_names {
            self.subsets[index].objects += 1;
            *self.classes.entry(name.to_string()).or_insert(0) += 1;
        }
    }

    pub fn add(&mut self, issue: ConversionIssue) {
        self.issues.push(issue);
    }

    pub fn subset(&self, name: &str) -> Option<&SubsetCounts> {
        self.subsets.iter().find(|s| s.name == name)
    }

    /// Total images written across subsets.
    pub fn written(&self) -> usize {
        self.subsets.iter().map(|s| s.images).sum()
    }

    pub fn count(&self, code: ConversionIssueCode) -> usize {
        self.issues.iter().filter(|i| i.code == code).count()
    }

    pub fn warning_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Warning)
            .count()
    }

    pub fn info_count(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.severity == ConversionSeverity::Info)
            .count()
    }
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{}: {} image(s) discovered, {} written to {}",
            self.job,
            self.discovered,
            self.written(),
            self.output.display()
        )?;
        for subset in &self.subsets {
            writeln!(
                f,
                "  {}: {} images, {} objects",
                subset.name, subset.images, subset.objects
            )?;
        }

        if !self.classes.is_empty() {
            writeln!(f)?;
            writeln!(f, "Objects per class:")?;
            for (name, count) in &self.classes {
                writeln!(f, "  {name}: {count}")?;
            }
        }

        for (title, severity, count) in [
            ("Warnings", ConversionSeverity::Warning, self.warning_count()),
            ("Notes", ConversionSeverity::Info, self.info_count()),
        ] {
            if count == 0 {
                continue;
            }
            writeln!(f)?;
            writeln!(f, "{title} ({count}):")?;
            for issue in self.issues.iter().filter(|i| i.severity == severity) {
                writeln!(f, "  - {}", issue.message)?;
            }
        }

        Ok(())
    }
}

/// A single issue noticed during conversion.
#[derive(Clone, Debug, Serialize)]
pub struct ConversionIssue {
    pub severity: ConversionSeverity,
    pub code: ConversionIssueCode,
    pub message: String,
}

impl ConversionIssue {
    /// Something was dropped from the output.
    pub fn warning(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Warning,
            code,
            message: message.into(),
        }
    }

    /// A policy decision that changed the output but dropped nothing.
    pub fn info(code: ConversionIssueCode, message: impl Into<String>) -> Self {
        Self {
            severity: ConversionSeverity::Info,
            code,
            message: message.into(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionSeverity {
    Warning,
    Info,
}

/// Stable issue codes for programmatic consumption.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversionIssueCode {
    /// An image had no sibling annotation document and was skipped.
    MissingAnnotation,
    /// A class folder was absent; it contributed no images.
    MissingClassFolder,
    /// Two source images share a file name within one subset; the later one won.
    DuplicateFileName,
    /// A box was clamped to the image bounds.
    BoxClamped,
}
