//! Equivalence checking between two evaluators of the same features

use thiserror::Error;

use crate::api::{NgramFeatureApply, PartialNgramFeatureApply};
use crate::context::{BOS, ContextWindow, Position};
use crate::hashing::mix;

/// First output that differs between two evaluators
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("sample {sample}: result[{target}] is {actual:#010x}, expected {expected:#010x}")]
pub struct Mismatch {
    /// Index of the generated context
    pub sample: usize,
    /// Output index that differs
    pub target: usize,
    /// Value written by the reference evaluator
    pub expected: u32,
    /// Value written by the evaluator under test
    pub actual: u32,
    /// Context that exposed the difference
    pub context: ContextWindow,
}

/// Deterministic generator of contexts compared on two evaluators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EquivalenceChecker {
    width: usize,
    samples: usize,
    value_range: u64,
    seed: u64,
}

impl EquivalenceChecker {
    /// Checker producing `samples` contexts whose slices hold `width` values
    pub fn new(width: usize, samples: usize) -> Self {
        Self {
            width,
            samples,
            value_range: 64,
            seed: 0x5eed,
        }
    }

    /// Limit slot values to `0..range`; small ranges produce repeated values
    pub fn with_value_range(mut self, range: u64) -> Self {
        self.value_range = range.max(1);
        self
    }

    /// Change the generator seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Context for one sample; every eighth sample starts at the sentence boundary
    pub fn context(&self, sample: usize) -> ContextWindow {
        let state = mix(self.seed, sample as u64);
        let slice = |position: Position| -> Vec<u64> {
            if sample % 8 == 7 && position == Position::T2 {
                return vec![BOS; self.width];
            }
            (0..self.width)
                .map(|slot| {
                    let key = (position.offset() * self.width + slot) as u64;
                    mix(state, key) % self.value_range
                })
                .collect()
        };
        ContextWindow::new(
            slice(Position::T2),
            slice(Position::T1),
            slice(Position::T0),
        )
    }

    /// Compare two evaluators given as closures writing `output_width` values
    pub fn check<E, A>(&self, output_width: usize, expected: E, actual: A) -> Result<(), Mismatch>
    where
        E: Fn(&mut [u32], &[u64], &[u64], &[u64]),
        A: Fn(&mut [u32], &[u64], &[u64], &[u64]),
    {
        let mut left = vec![0u32; output_width];
        let mut right = vec![0u32; output_width];
        for sample in 0..self.samples {
            let context = self.context(sample);
            let (t2, t1, t0) = context.slices();
            left.fill(0);
            right.fill(0);
            expected(&mut left, t2, t1, t0);
            actual(&mut right, t2, t1, t0);

            if let Some(target) = (0..output_width).find(|&i| left[i] != right[i]) {
                return Err(Mismatch {
                    sample,
                    target,
                    expected: left[target],
                    actual: right[target],
                    context,
                });
            }
        }
        Ok(())
    }

    /// Compare two full ngram evaluators
    pub fn check_ngram(
        &self,
        expected: &dyn NgramFeatureApply,
        actual: &dyn NgramFeatureApply,
    ) -> Result<(), Mismatch> {
        let width = expected.output_width().max(actual.output_width());
        self.check(
            width,
            |r, t2, t1, t0| expected.apply(r, t2, t1, t0),
            |r, t2, t1, t0| actual.apply(r, t2, t1, t0),
        )
    }

    /// Compare two partial ngram evaluators
    pub fn check_partial_ngram(
        &self,
        expected: &dyn PartialNgramFeatureApply,
        actual: &dyn PartialNgramFeatureApply,
    ) -> Result<(), Mismatch> {
        let width = expected.output_width().max(actual.output_width());
        self.check(
            width,
            |r, t2, t1, t0| expected.apply(r, t2, t1, t0),
            |r, t2, t1, t0| actual.apply(r, t2, t1, t0),
        )
    }
}
