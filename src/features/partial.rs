//! Partial ngram feature combinations

use serde::{Deserialize, Serialize};

use crate::api::PartialNgramFeatureApply;
use crate::context::Position;
use crate::hashing::{PARTIAL_TAG, SEED, finish, mix};

/// A feature over any subset of the three positions, e.g. a skip bigram of t2 and t0
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialNgramFeature {
    /// Output index the feature id is written to
    pub index: u32,
    /// Slot read from the current node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t0: Option<u32>,
    /// Slot read from the previous node
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t1: Option<u32>,
    /// Slot read from the node before the previous one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub t2: Option<u32>,
}

impl PartialNgramFeature {
    /// Feature without any position; add them with [`with`](Self::with)
    pub fn new(index: u32) -> Self {
        Self {
            index,
            ..Self::default()
        }
    }

    /// Read `slot` from `position`
    pub fn with(mut self, position: Position, slot: u32) -> Self {
        match position {
            Position::T0 => self.t0 = Some(slot),
            Position::T1 => self.t1 = Some(slot),
            Position::T2 => self.t2 = Some(slot),
        }
        self
    }

    /// Slot read from `position`, if any
    pub fn slot(&self, position: Position) -> Option<u32> {
        match position {
            Position::T0 => self.t0,
            Position::T1 => self.t1,
            Position::T2 => self.t2,
        }
    }

    /// `(position, slot)` pairs in combination order
    pub fn reads(&self) -> impl Iterator<Item = (Position, u32)> + '_ {
        Position::ALL
            .into_iter()
            .filter_map(|position| self.slot(position).map(|slot| (position, slot)))
    }

    /// Hash tag: the partial marker plus a bit per position read
    pub fn tag(&self) -> u64 {
        self.reads()
            .fold(PARTIAL_TAG, |tag, (position, _)| tag | position.mask_bit())
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

/// Interpreted evaluator over a list of [`PartialNgramFeature`]s
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialNgramDynamicFeatureApply {
    features: Vec<PartialNgramFeature>,
}

impl PartialNgramDynamicFeatureApply {
    /// Create an evaluator; features are evaluated in the given order
    pub fn new(features: Vec<PartialNgramFeature>) -> Self {
        Self { features }
    }

    /// Declared features
    pub fn features(&self) -> &[PartialNgramFeature] {
        &self.features
    }
}

impl PartialNgramFeatureApply for PartialNgramDynamicFeatureApply {
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_encodes_positions() {
        let skip = PartialNgramFeature::new(0)
            .with(Position::T2, 1)
            .with(Position::T0, 3);
        assert_eq!(skip.tag(), PARTIAL_TAG | 0b101);
        assert_eq!(
            skip.reads().collect::<Vec<_>>(),
            vec![(Position::T0, 3), (Position::T2, 1)]
        );
    }

    #[test]
    fn test_skip_bigram_ignores_t1() {
        let apply = PartialNgramDynamicFeatureApply::new(vec![
            PartialNgramFeature::new(0)
                .with(Position::T0, 0)
                .with(Position::T2, 0),
        ]);

        let mut first = [0u32; 1];
        let mut second = [0u32; 1];
        apply.apply(&mut first, &[7], &[1], &[8]);
        apply.apply(&mut second, &[7], &[2], &[8]);
        assert_eq!(first, second);
    }

    #[test]
    fn test_deserialize_skips_absent_positions() {
        let feature: PartialNgramFeature =
            serde_json::from_str(r#"{"index": 4, "t1": 2}"#).unwrap();
        assert_eq!(feature, PartialNgramFeature::new(4).with(Position::T1, 2));
    }
}
