//! Full ngram feature combinations

use serde::{Deserialize, Serialize};
use smallvec::{SmallVec, smallvec};

use crate::api::NgramFeatureApply;
use crate::context::Position;
use crate::hashing::{SEED, finish, mix};

/// One full ngram feature.
///
/// `arguments[k]` is the primitive slot read from position `tk`, so a unigram reads
/// `t0`, a bigram `t0` and `t1`, a trigram all three positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NgramFeature {
    /// Output index the feature id is written to
    pub index: u32,
    /// Primitive slot per position, starting at t0
    pub arguments: SmallVec<[u32; 3]>,
}

impl NgramFeature {
    /// Feature reading `t0[t0]`
    pub fn unigram(index: u32, t0: u32) -> Self {
        Self {
            index,
            arguments: smallvec![t0],
        }
    }

    /// Feature reading `t0[t0]` and `t1[t1]`
    pub fn bigram(index: u32, t0: u32, t1: u32) -> Self {
        Self {
            index,
            arguments: smallvec![t0, t1],
        }
    }

    /// Feature reading one slot of each position
    pub fn trigram(index: u32, t0: u32, t1: u32, t2: u32) -> Self {
        Self {
            index,
            arguments: smallvec![t0, t1, t2],
        }
    }

    /// Number of positions combined
    pub fn order(&self) -> usize {
        self.arguments.len()
    }

    /// Hash tag separating orders from each other
    pub fn tag(&self) -> u64 {
        self.order() as u64
    }

    /// `(position, slot)` pairs in combination order
    pub fn reads(&self) -> impl Iterator<Item = (Position, u32)> + '_ {
        Position::ALL.into_iter().zip(self.arguments.iter().copied())
    }

    #[inline]
    fn evaluate(&self, t2: &[u64], t1: &[u64], t0: &[u64]) -> u32 {
        let mut state = mix(mix(SEED, u64::from(self.index)), self.tag());
        for (position, slot) in self.reads() {
            state = mix(state, position.select(t2, t1, t0)[slot as usize]);
        }
        finish(state)
    }
}

/// Interpreted evaluator over a list of [`NgramFeature`]s
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NgramDynamicFeatureApply {
    features: Vec<NgramFeature>,
}

impl NgramDynamicFeatureApply {
    /// Create an evaluator; features are evaluated in the given order
    pub fn new(features: Vec<NgramFeature>) -> Self {
        Self { features }
    }

    /// Declared features
    pub fn features(&self) -> &[NgramFeature] {
        &self.features
    }
}

impl NgramFeatureApply for NgramDynamicFeatureApply {
    fn output_width(&self) -> usize {
        self.features
            .iter()
            .map(|f| f.index as usize + 1)
            .max()
            .unwrap_or(0)
    }

    fn apply(&self, result: &mut [u32], t2: &[u64], t1: &[u64], t0: &[u64]) {
        for feature in &self.features {
            result[feature.index as usize] = feature.evaluate(t2, t1, t0);
        }
    }
}
