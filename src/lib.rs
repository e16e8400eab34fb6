//! Feature function compiler for lattice-based morphological analysis
//!
//! The analysis core scores every lattice node with n-gram features that combine
//! primitive feature values of the current node (`t0`), the previous node (`t1`)
//! and the one before it (`t2`). This crate turns the declared combinations into
//! specialized evaluators:
//!
//! - [`combiner`] builds a backend-neutral intermediate representation
//!   ([`combiner::FeatureProgram`]) and can compile it into closures at runtime
//! - [`codegen`] renders the same IR into Rust source artifacts implementing
//!   [`StaticFeatureFactory`]
//! - [`analysis`] wires static or runtime-compiled evaluators into the scorer and falls
//!   back to the interpreted evaluators for any kind that is unavailable
//!
//! ```no_run
//! use lattice_feature_codegen::codegen::{FeatureCodegenConfig, StaticFeatureCodegen};
//! use lattice_feature_codegen::diagnostics::LogSink;
//! use lattice_feature_codegen::features::FeatureSpec;
//!
//! # fn main() -> anyhow::Result<()> {
//! let spec = FeatureSpec::from_json(&std::fs::read_to_string("features.json")?)?;
//! let holder = spec.into_holder();
//!
//! let config = FeatureCodegenConfig::new("target/generated", "jpp_features", "JppFeatures");
//! let codegen = StaticFeatureCodegen::new(config)?;
//! let report = codegen.generate_and_write(&holder, &mut LogSink)?;
//! println!("ngram compiled: {}", report.ngram);
//! # Ok(())
//! # }
//! ```

pub mod analysis;
pub mod api;
pub mod codegen;
pub mod combiner;
pub mod context;
pub mod diagnostics;
pub mod error;
pub mod features;
pub mod hashing;

pub use api::{
    NgramFeatureApply, PartialNgramFeatureApply, PrimitiveFeatureApply, StaticFeatureFactory,
};
pub use context::{BOS, ContextSlice, ContextWindow, FeatureOutput, Position};
pub use error::{CodegenError, CompilationError, Result};
pub use features::{FeatureHolder, FeatureKind};
