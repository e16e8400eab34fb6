//! Lowering of feature combinations into [`FeatureProgram`]s

use std::collections::BTreeSet;

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use super::ir::{Assignment, Expr, FeatureProgram, Load};
use crate::context::Position;
use crate::error::{CompilationError, CompilationResult};
use crate::features::{
    FeatureHolder, FeatureKind, NgramDynamicFeatureApply, PartialNgramDynamicFeatureApply,
};
use crate::hashing::SEED;

/// Maximum number of positions a feature can combine
pub const MAX_ORDER: usize = 3;

/// Configuration for the feature combiner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinerConfig {
    /// Fold the constant prefix of every feature hash at compile time
    pub constant_folding: bool,
    /// Read each context slot once into a local before the assignments
    pub hoist_loads: bool,
}

impl Default for CombinerConfig {
    fn default() -> Self {
        Self {
            constant_folding: true,
            hoist_loads: true,
        }
    }
}

/// Feature description shared by both kinds during lowering
struct Combination {
    index: u32,
    tag: u64,
    reads: Vec<(Position, u32)>,
}

/// Builds [`FeatureProgram`]s from the registry's combination definitions
///
/// Lowering is deterministic: the same definitions always produce the same
/// program, and nothing but the returned value is affected.
#[derive(Debug, Clone, Default)]
pub struct FeatureCombiner {
    config: CombinerConfig,
}

impl FeatureCombiner {
    /// Create a combiner with the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a combiner with a custom configuration
    pub fn with_config(config: CombinerConfig) -> Self {
        Self { config }
    }

    /// Active configuration
    pub fn config(&self) -> &CombinerConfig {
        &self.config
    }

    /// Lower one kind of the holder's definitions
    pub fn combine(
        &self,
        features: &FeatureHolder,
        kind: FeatureKind,
    ) -> CompilationResult<FeatureProgram> {
        let width = features.context_width();
        match kind {
            FeatureKind::Ngram => self.combine_ngram(features.ngram_dynamic(), width),
            FeatureKind::PartialNgram => {
                self.combine_partial_ngram(features.partial_ngram_dynamic(), width)
            }
        }
    }

    /// Lower the full ngram combination
    pub fn combine_ngram(
        &self,
        ngram: Option<&NgramDynamicFeatureApply>,
        context_width: usize,
    ) -> CompilationResult<FeatureProgram> {
        let ngram = ngram.ok_or(CompilationError::MissingDefinition {
            kind: FeatureKind::Ngram,
        })?;

        let combinations = ngram
            .features()
            .iter()
            .map(|feature| {
                if feature.arguments.is_empty() || feature.arguments.len() > MAX_ORDER {
                    return Err(CompilationError::UnsupportedArity {
                        feature: feature.index,
                        arity: feature.arguments.len(),
                    });
                }
                Ok(Combination {
                    index: feature.index,
                    tag: feature.tag(),
                    reads: feature.reads().collect(),
                })
            })
            .collect::<CompilationResult<Vec<_>>>()?;

        self.lower(FeatureKind::Ngram, context_width, combinations)
    }

    /// Lower the partial ngram combination
    pub fn combine_partial_ngram(
        &self,
        partial: Option<&PartialNgramDynamicFeatureApply>,
        context_width: usize,
    ) -> CompilationResult<FeatureProgram> {
        let partial = partial.ok_or(CompilationError::MissingDefinition {
            kind: FeatureKind::PartialNgram,
        })?;

        let combinations = partial
            .features()
            .iter()
            .map(|feature| {
                let reads: Vec<_> = feature.reads().collect();
                if reads.is_empty() {
                    return Err(CompilationError::EmptyFeature {
                        feature: feature.index,
                    });
                }
                Ok(Combination {
                    index: feature.index,
                    tag: feature.tag(),
                    reads,
                })
            })
            .collect::<CompilationResult<Vec<_>>>()?;

        self.lower(FeatureKind::PartialNgram, context_width, combinations)
    }

    fn lower(
        &self,
        kind: FeatureKind,
        context_width: usize,
        combinations: Vec<Combination>,
    ) -> CompilationResult<FeatureProgram> {
        let mut targets = FxHashSet::default();
        let mut assignments = Vec::with_capacity(combinations.len());

        for combination in combinations {
            if !targets.insert(combination.index) {
                return Err(CompilationError::DuplicateTarget {
                    target: combination.index,
                });
            }

            let prefix = Expr::mix(
                Expr::mix(Expr::Const(SEED), Expr::Const(u64::from(combination.index))),
                Expr::Const(combination.tag),
            );
            let mut value = prefix;
            for (position, slot) in combination.reads {
                if slot as usize >= context_width {
                    return Err(CompilationError::SlotOutOfRange {
                        feature: combination.index,
                        position,
                        slot,
                        width: context_width,
                    });
                }
                value = Expr::mix(value, Expr::Load(Load::new(position, slot)));
            }

            if self.config.constant_folding {
                value = value.fold_constants();
            }
            assignments.push(Assignment {
                target: combination.index,
                value,
            });
        }

        let hoisted = if self.config.hoist_loads {
            let mut loads = BTreeSet::new();
            for assignment in &assignments {
                assignment.value.collect_loads(&mut loads);
            }
            loads.into_iter().collect()
        } else {
            Vec::new()
        };

        let output_width = assignments
            .iter()
            .map(|a| a.target as usize + 1)
            .max()
            .unwrap_or(0);

        Ok(FeatureProgram::new(
            kind,
            context_width,
            output_width,
            hoisted,
            assignments,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{NgramFeatureApply, PartialNgramFeatureApply};
    use crate::features::{NgramFeature, PartialNgramFeature};
    use crate::hashing::mix;
    use rstest::rstest;
    use smallvec::smallvec;

    fn ngram_features() -> NgramDynamicFeatureApply {
        NgramDynamicFeatureApply::new(vec![
            NgramFeature::unigram(0, 0),
            NgramFeature::bigram(1, 1, 0),
            NgramFeature::trigram(3, 2, 1, 0),
        ])
    }

    #[test]
    fn test_missing_definition() {
        let err = FeatureCombiner::new().combine_ngram(None, 3).unwrap_err();
        assert_eq!(
            err,
            CompilationError::MissingDefinition {
                kind: FeatureKind::Ngram
            }
        );
    }

    #[test]
    fn test_folded_prefix_is_single_constant() {
        let program = FeatureCombiner::new()
            .combine_ngram(Some(&ngram_features()), 3)
            .unwrap();

        assert_eq!(program.output_width(), 4);
        assert_eq!(
            program.assignments()[0].value,
            Expr::mix(
                Expr::Const(mix(mix(SEED, 0), 1)),
                Expr::Load(Load::new(Position::T0, 0))
            )
        );
        assert_eq!(
            program.hoisted_loads(),
            &[
                Load::new(Position::T0, 0),
                Load::new(Position::T0, 1),
                Load::new(Position::T0, 2),
                Load::new(Position::T1, 0),
                Load::new(Position::T1, 1),
                Load::new(Position::T2, 0),
            ]
        );
    }

    #[rstest]
    #[case(CombinerConfig { constant_folding: true, hoist_loads: true })]
    #[case(CombinerConfig { constant_folding: false, hoist_loads: true })]
    #[case(CombinerConfig { constant_folding: true, hoist_loads: false })]
    #[case(CombinerConfig { constant_folding: false, hoist_loads: false })]
    fn test_program_matches_dynamic_ngram(#[case] config: CombinerConfig) {
        let dynamic = ngram_features();
        let program = FeatureCombiner::with_config(config)
            .combine_ngram(Some(&dynamic), 3)
            .unwrap();

        let (t2, t1, t0) = ([11u64, 12, 13], [21u64, 22, 23], [31u64, 32, 33]);
        let mut expected = [0u32; 4];
        let mut actual = [0u32; 4];
        dynamic.apply(&mut expected, &t2, &t1, &t0);
        program.apply(&mut actual, &t2, &t1, &t0);

        assert_eq!(expected, actual);
    }

    #[test]
    fn test_program_matches_dynamic_partial() {
        let dynamic = PartialNgramDynamicFeatureApply::new(vec![
            PartialNgramFeature::new(0)
                .with(Position::T2, 1)
                .with(Position::T0, 0),
            PartialNgramFeature::new(1).with(Position::T1, 1),
        ]);
        let program = FeatureCombiner::new()
            .combine_partial_ngram(Some(&dynamic), 2)
            .unwrap();

        let (t2, t1, t0) = ([5u64, 6], [7u64, 8], [9u64, 10]);
        let mut expected = [0u32; 2];
        let mut actual = [0u32; 2];
        dynamic.apply(&mut expected, &t2, &t1, &t0);
        program.apply(&mut actual, &t2, &t1, &t0);

        assert_eq!(expected, actual);
        assert_eq!(program.kind(), FeatureKind::PartialNgram);
    }

    #[test]
    fn test_slot_out_of_range() {
        let err = FeatureCombiner::new()
            .combine_ngram(Some(&ngram_features()), 2)
            .unwrap_err();
        assert_eq!(
            err,
            CompilationError::SlotOutOfRange {
                feature: 3,
                position: Position::T0,
                slot: 2,
                width: 2,
            }
        );
    }

    #[test]
    fn test_duplicate_target() {
        let dynamic = NgramDynamicFeatureApply::new(vec![
            NgramFeature::unigram(1, 0),
            NgramFeature::bigram(1, 0, 0),
        ]);
        let err = FeatureCombiner::new()
            .combine_ngram(Some(&dynamic), 1)
            .unwrap_err();
        assert_eq!(err, CompilationError::DuplicateTarget { target: 1 });
    }

    #[rstest]
    #[case(vec![])]
    #[case(vec![0, 0, 0, 0])]
    fn test_unsupported_arity(#[case] arguments: Vec<u32>) {
        let arity = arguments.len();
        let dynamic = NgramDynamicFeatureApply::new(vec![NgramFeature {
            index: 0,
            arguments: arguments.into_iter().collect(),
        }]);
        let err = FeatureCombiner::new()
            .combine_ngram(Some(&dynamic), 1)
            .unwrap_err();
        assert_eq!(
            err,
            CompilationError::UnsupportedArity { feature: 0, arity }
        );
    }

    #[test]
    fn test_empty_partial_feature() {
        let dynamic = PartialNgramDynamicFeatureApply::new(vec![PartialNgramFeature::new(2)]);
        let err = FeatureCombiner::new()
            .combine_partial_ngram(Some(&dynamic), 1)
            .unwrap_err();
        assert_eq!(err, CompilationError::EmptyFeature { feature: 2 });
    }

    #[test]
    fn test_lowering_is_deterministic() {
        let dynamic = NgramDynamicFeatureApply::new(vec![
            NgramFeature::trigram(0, 0, 0, 0),
            NgramFeature {
                index: 1,
                arguments: smallvec![1, 0],
            },
        ]);
        let combiner = FeatureCombiner::new();
        let first = combiner.combine_ngram(Some(&dynamic), 2).unwrap();
        let second = combiner.combine_ngram(Some(&dynamic), 2).unwrap();
        assert_eq!(first, second);
    }
}
