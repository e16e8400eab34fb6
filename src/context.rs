//! Context encoding of the three lattice positions an evaluator sees

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::PrimitiveFeatureApply;

/// Encoded primitive feature values of one lattice position
pub type ContextSlice<'a> = &'a [u64];

/// Caller-owned buffer an evaluator writes feature ids into
pub type FeatureOutput<'a> = &'a mut [u32];

/// Encoding used for every slot of a position outside the sentence
pub const BOS: u64 = u64::MAX;

/// Relative lattice position
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    /// Current node
    T0,
    /// Previous node
    T1,
    /// Node before the previous one
    T2,
}

impl Position {
    /// All positions in combination order
    pub const ALL: [Position; 3] = [Position::T0, Position::T1, Position::T2];

    /// Distance from the current node
    pub fn offset(self) -> usize {
        match self {
            Position::T0 => 0,
            Position::T1 => 1,
            Position::T2 => 2,
        }
    }

    /// Bit of this position in a position mask
    pub fn mask_bit(self) -> u64 {
        1 << self.offset()
    }

    /// Parameter name of this position in generated code
    pub fn name(self) -> &'static str {
        match self {
            Position::T0 => "t0",
            Position::T1 => "t1",
            Position::T2 => "t2",
        }
    }

    /// Pick the slice of this position out of an evaluator's arguments
    #[inline(always)]
    pub fn select<'a>(self, t2: &'a [u64], t1: &'a [u64], t0: &'a [u64]) -> &'a [u64] {
        match self {
            Position::T0 => t0,
            Position::T1 => t1,
            Position::T2 => t2,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Owned encodings of the three positions around a lattice node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextWindow {
    t2: Vec<u64>,
    t1: Vec<u64>,
    t0: Vec<u64>,
}

impl ContextWindow {
    /// Create a window from already encoded slices
    pub fn new(t2: Vec<u64>, t1: Vec<u64>, t0: Vec<u64>) -> Self {
        Self { t2, t1, t0 }
    }

    /// Window at the start of a sentence: every position reads as [`BOS`]
    pub fn bos(width: usize) -> Self {
        Self::new(vec![BOS; width], vec![BOS; width], vec![BOS; width])
    }

    /// Encode three dictionary entries through a primitive applier.
    ///
    /// Missing entries (`None`) are positions before the sentence start and are
    /// encoded as [`BOS`].
    pub fn from_entries(
        primitive: &dyn PrimitiveFeatureApply,
        t2: Option<&[i32]>,
        t1: Option<&[i32]>,
        t0: Option<&[i32]>,
    ) -> Self {
        let encode = |entry: Option<&[i32]>| {
            let mut slice = vec![BOS; primitive.width()];
            if let Some(entry) = entry {
                primitive.apply(entry, &mut slice);
            }
            slice
        };
        Self::new(encode(t2), encode(t1), encode(t0))
    }

    /// Shift the window by one node: t1 becomes t2, t0 becomes t1
    pub fn advance(&mut self, next: Vec<u64>) {
        self.t2 = std::mem::replace(&mut self.t1, std::mem::replace(&mut self.t0, next));
    }

    /// Slice for one position
    pub fn get(&self, position: Position) -> &[u64] {
        position.select(&self.t2, &self.t1, &self.t0)
    }

    /// Slices in evaluator argument order `(t2, t1, t0)`
    pub fn slices(&self) -> (&[u64], &[u64], &[u64]) {
        (&self.t2, &self.t1, &self.t0)
    }

    /// Width of the current position's slice
    pub fn width(&self) -> usize {
        self.t0.len()
    }
}
