//! Dynamic feature combiner
//!
//! Lowers declared combinations into a [`FeatureProgram`], compiles programs into
//! closures and checks compiled evaluators against interpreted ones.

pub mod builder;
pub mod compiled;
pub mod ir;
pub mod verify;

pub use builder::{CombinerConfig, FeatureCombiner, MAX_ORDER};
pub use compiled::{CompiledNgramApply, CompiledPartialNgramApply, CompiledProgram};
pub use ir::{Assignment, Expr, FeatureProgram, Load};
pub use verify::{EquivalenceChecker, Mismatch};
