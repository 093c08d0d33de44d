//! Class vocabulary: the ordered list of class names that defines label ids.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

use crate::error::DefectPrepError;

/// A 0-based class index into a [`ClassVocabulary`].
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub usize);

impl ClassId {
    #[inline]
    pub fn new(id: usize) -> Self {
        Self(id)
    }

    #[inline]
    pub fn as_usize(&self) -> usize {
        self.0
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ClassId({})", self.0)
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for ClassId {
    fn from(id: usize) -> Self {
        Self(id)
    }
}

/// An ordered, duplicate-free list of class names.
///
/// The position of a name is its class id in every label file written with
/// this vocabulary.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ClassVocabulary {
    names: Vec<String>,
}

/// GC10-DET defect classes, in label-id order.
pub const GC10_DET_CLASSES: [&str; 10] = [
    "punching_hole",
    "welding_line",
    "crescent_gap",
    "water_spot",
    "oil_spot",
    "silk_spot",
    "inclusion",
    "rolled_pit",
    "crease",
    "waist_folding",
];

/// NEU-DET defect classes, in label-id order.
pub const NEU_DET_CLASSES: [&str; 6] = [
    "crazing",
    "inclusion",
    "patches",
    "pitted_surface",
    "rolled-in_scale",
    "scratches",
];

impl ClassVocabulary {
    /// Builds a vocabulary, rejecting empty and duplicate names.
    pub fn new<I, S>(names: I) -> Result<Self, DefectPrepError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        if names.is_empty() {
            return Err(DefectPrepError::InvalidVocabulary {
                message: "vocabulary must contain at least one class".to_string(),
            });
        }

        let mut seen = HashSet::new();
        for (idx, name) in names.iter().enumerate() {
            if name.trim().is_empty() {
                return Err(DefectPrepError::InvalidVocabulary {
                    message: format!("class name at position {idx} is empty"),
                });
            }
            if !seen.insert(name.as_str()) {
                return Err(DefectPrepError::InvalidVocabulary {
                    message: format!("class name '{name}' appears more than once"),
                });
            }
        }

        Ok(Self { names })
    }

    pub fn gc10_det() -> Self {
        Self {
            names: GC10_DET_CLASSES.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn neu_det() -> Self {
        Self {
            names: NEU_DET_CLASSES.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Looks up the class id for an exact class name.
    pub fn index_of(&self, name: &str) -> Option<ClassId> {
        self.names
            .iter()
            .position(|candidate| candidate == name)
            .map(ClassId::new)
    }

    pub fn name(&self, id: ClassId) -> Option<&str> {
        self.names.get(id.as_usize()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Iterates `(id, name)` pairs in vocabulary order.
    pub fn iter(&self) -> impl Iterator<Item = (ClassId, &str)> {
        self.names
            .iter()
            .enumerate()
            .map(|(idx, name)| (ClassId::new(idx), name.as_str()))
    }
}

impl TryFrom<Vec<String>> for ClassVocabulary {
    type Error = DefectPrepError;

    fn try_from(names: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(names)
    }
}

impl From<ClassVocabulary> for Vec<String> {
    fn from(vocab: ClassVocabulary) -> Self {
        vocab.names
    }
}
