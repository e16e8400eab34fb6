//! Runtime backend: compiles a [`FeatureProgram`] into closures
//!
//! Used when no generated artifact is linked into the binary. Each expression tree
//! becomes one boxed closure; the common shapes `mix(const, load)` and
//! `mix(expr, load)` get dedicated closures so a typical trigram needs three
//! indirect calls instead of a tree walk.

use std::fmt;

use super::ir::{Expr, FeatureProgram};
use crate::api::{NgramFeatureApply, PartialNgramFeatureApply};
use crate::features::FeatureKind;
use crate::hashing::{finish, mix};

type CompiledExpr = Box<dyn Fn(&[u64], &[u64], &[u64]) -> u64 + Send + Sync>;

fn compile_expr(expr: &Expr) -> CompiledExpr {
    match expr {
        Expr::Const(value) => {
            let value = *value;
            Box::new(move |_: &[u64], _: &[u64], _: &[u64]| value)
        }
        Expr::Load(load) => {
            let (position, slot) = (load.position, load.slot as usize);
            Box::new(move |t2: &[u64], t1: &[u64], t0: &[u64]| position.select(t2, t1, t0)[slot])
        }
        Expr::Mix(state, value) => match (state.as_ref(), value.as_ref()) {
            (Expr::Const(state), Expr::Load(load)) => {
                let (state, position, slot) = (*state, load.position, load.slot as usize);
                Box::new(move |t2: &[u64], t1: &[u64], t0: &[u64]| {
                    mix(state, position.select(t2, t1, t0)[slot])
                })
            }
            (state, Expr::Load(load)) => {
                let state = compile_expr(state);
                let (position, slot) = (load.position, load.slot as usize);
                Box::new(move |t2: &[u64], t1: &[u64], t0: &[u64]| {
                    mix(state(t2, t1, t0), position.select(t2, t1, t0)[slot])
                })
            }
            (state, value) => {
                let state = compile_expr(state);
                let value = compile_expr(value);
                Box::new(move |t2: &[u64], t1: &[u64], t0: &[u64]| {
                    mix(state(t2, t1, t0), value(t2, t1, t0))
                })
            }
        },
    }
}

/// Closure-compiled program, independent of the feature kind
pub struct CompiledProgram {
    kind: FeatureKind,
    output_width: usize,
    assignments: Vec<(usize, CompiledExpr)>,
}

impl CompiledProgram {
    /// Compile every assignment of `program`
    pub fn compile(program: &FeatureProgram) -> Self {
        let assignments = program
            .assignments()
            .iter()
            .map(|a| (a.target as usize, compile_expr(&a.value)))
            .collect();
        Self {
            kind: program.kind(),
            output_width: program.output_width(),
            assignments,
        }
    }

    /// Feature kind of the source program
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    #[inline]
    fn apply(&self, result: &mut [u32], t2: &[u64], t1: &[u64], t0: &[u64]) {
        debug_assert!(result.len() >= self.output_width);
        for (target, expr) in &self.assignments {
            result[*target] = finish(expr(t2, t1, t0));
        }
    }
}

impl fmt::Debug for CompiledProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CompiledProgram")
            .field("kind", &self.kind)
            .field("output_width", &self.output_width)
            .field("assignments", &self.assignments.len())
            .finish()
    }
}

/// Closure-compiled full ngram evaluator
#[derive(Debug)]
pub struct CompiledNgramApply(CompiledProgram);

impl CompiledNgramApply {
    /// Compile an ngram program
    pub fn compile(program: &FeatureProgram) -> Self {
        debug_assert_eq!(program.kind(), FeatureKind::Ngram);
        Self(CompiledProgram::compile(program))
    }
}

impl NgramFeatureApply for CompiledNgramApply {
    fn output_width(&self) -> usize {
        self.0.output_width
    }

    fn apply(&self, result: &mut [u32], t2: &[u64], t1: &[u64], t0: &[u64]) {
        self.0.apply(result, t2, t1, t0);
    }
}

/// Closure-compiled partial ngram evaluator
#[derive(Debug)]
pub struct CompiledPartialNgramApply(CompiledProgram);

impl CompiledPartialNgramApply {
    /// Compile a partial ngram program
    pub fn compile(program: &FeatureProgram) -> Self {
        debug_assert_eq!(program.kind(), FeatureKind::PartialNgram);
        Self(CompiledProgram::compile(program))
    }
}

impl PartialNgramFeatureApply for CompiledPartialNgramApply {
    fn output_width(&self) -> usize {
        self.0.output_width
    }

    fn apply(&self, result: &mut [u32], t2: &[u64], t1: &[u64], t0: &[u64]) {
        self.0.apply(result, t2, t1, t0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combiner::{CombinerConfig, FeatureCombiner};
    use crate::context::Position;
    use crate::features::{
        NgramDynamicFeatureApply, NgramFeature, PartialNgramDynamicFeatureApply,
        PartialNgramFeature,
    };

    #[test]
    fn test_compiled_ngram_matches_program() {
        let dynamic = NgramDynamicFeatureApply::new(vec![
            NgramFeature::unigram(0, 1),
            NgramFeature::trigram(1, 0, 1, 0),
        ]);
        // unfolded trees exercise the generic mix closure
        for config in [
            CombinerConfig::default(),
            CombinerConfig {
                constant_folding: false,
                hoist_loads: false,
            },
        ] {
            let program = FeatureCombiner::with_config(config)
                .combine_ngram(Some(&dynamic), 2)
                .unwrap();
            let compiled = CompiledNgramApply::compile(&program);

            let (t2, t1, t0) = ([1u64, 2], [3u64, 4], [5u64, 6]);
            let mut expected = [0u32; 2];
            let mut actual = [0u32; 2];
            dynamic.apply(&mut expected, &t2, &t1, &t0);
            compiled.apply(&mut actual, &t2, &t1, &t0);

            assert_eq!(expected, actual);
            assert_eq!(compiled.output_width(), 2);
        }
    }

    #[test]
    fn test_compiled_partial_matches_dynamic() {
        let dynamic = PartialNgramDynamicFeatureApply::new(vec![
            PartialNgramFeature::new(1).with(Position::T2, 0),
            PartialNgramFeature::new(0)
                .with(Position::T1, 0)
                .with(Position::T0, 0),
        ]);
        let program = FeatureCombiner::new()
            .combine_partial_ngram(Some(&dynamic), 1)
            .unwrap();
        let compiled = CompiledPartialNgramApply::compile(&program);

        let mut expected = [0u32; 2];
        let mut actual = [0u32; 2];
        dynamic.apply(&mut expected, &[7], &[8], &[9]);
        compiled.apply(&mut actual, &[7], &[8], &[9]);

        assert_eq!(expected, actual);
        assert_eq!(compiled.0.kind(), FeatureKind::PartialNgram);
    }
}
