//! Seeded train/val/test partitioning.

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::DefectPrepError;

/// Seed used when none is configured.
pub const DEFAULT_SEED: u64 = 42;

// Absorbs representation error such as 10 * 0.30000000000000004 before ceil.
const CEIL_EPSILON: f64 = 1e-9;

/// A dataset subset.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Split {
    Train,
    Val,
    Test,
}

impl Split {
    pub const ALL: [Split; 3] = [Split::Train, Split::Val, Split::Test];

    /// Directory name used under `images/` and `labels/`.
    pub fn dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Val => "val",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

/// Fractions of the dataset assigned to each split.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitRatios {
    pub train: f64,
    pub val: f64,
    pub test: f64,
}

impl Default for SplitRatios {
    fn default() -> Self {
        Self {
            train: 0.70,
            val: 0.15,
            test: 0.15,
        }
    }
}

impl SplitRatios {
    /// Ratios must be finite, non-negative and sum to 1.
    pub fn validate(&self) -> Result<(), DefectPrepError> {
        for (name, value) in [("train", self.train), ("val", self.val), ("test", self.test)] {
            if !value.is_finite() || value < 0.0 {
                return Err(DefectPrepError::InvalidConfig {
                    message: format!("{name} ratio must be a non-negative number, got {value}"),
                });
            }
        }

        let sum = self.train + self.val + self.test;
        if (sum - 1.0).abs() > 1e-6 {
            return Err(DefectPrepError::InvalidConfig {
                message: format!("split ratios must sum to 1.0, got {sum}"),
            });
        }

        Ok(())
    }
}

/// Items partitioned into disjoint splits.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SplitAssignment<T> {
    pub train: Vec<T>,
    pub val: Vec<T>,
    pub test: Vec<T>,
}

impl<T> SplitAssignment<T> {
    pub fn get(&self, split: Split) -> &[T] {
        match split {
            Split::Train => &self.train,
            Split::Val => &self.val,
            Split::Test => &self.test,
        }
    }

    pub fn len(&self) -> usize {
        self.train.len() + self.val.len() + self.test.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates `(split, item)` pairs, train first.
    pub fn iter(&self) -> impl Iterator<Item = (Split, &T)> {
        Split::ALL
            .into_iter()
            .flat_map(move |split| self.get(split).iter().map(move |item| (split, item)))
    }
}

/// Computes `(train, val, test)` sizes for `total` items.
///
/// The held-out share is rounded up first and the train split takes the
/// rest; the held-out items are then divided between val and test with the
/// test share rounded up.
pub fn split_counts(total: usize, ratios: &SplitRatios) -> (usize, usize, usize) {
    let held_out_ratio = ratios.val + ratios.test;
    if total == 0 || held_out_ratio <= 0.0 {
        return (total, 0, 0);
    }

    let held_out = ceil_count(total, held_out_ratio).min(total);
    let test = ceil_count(held_out, ratios.test / held_out_ratio).min(held_out);
    let val = held_out - test;

    (total - held_out, val, test)
}

fn ceil_count(n: usize, fraction: f64) -> usize {
    let raw = (n as f64 * fraction - CEIL_EPSILON).ceil();
    if raw <= 0.0 {
        0
    } else {
        raw as usize
    }
}

/// Shuffles `items` with a seeded RNG and cuts them into splits.
///
/// The result depends only on the input order, the ratios and the seed, so
/// callers must give a deterministic order (see
/// [`collect_files_with_extensions`](crate::walk::collect_files_with_extensions)).
pub fn partition<T>(mut items: Vec<T>, ratios: &SplitRatios, seed: u64) -> SplitAssignment<T> {
    let (n_train, n_val, _) = split_counts(items.len(), ratios);

    let mut rng = StdRng::seed_from_u64(seed);
    items.shuffle(&mut rng);

    let mut val = items.split_off(n_train);
    let test = val.split_off(n_val);

    SplitAssignment {
        train: items,
        val,
        test,
    }
}
