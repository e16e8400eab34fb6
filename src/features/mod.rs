//! Feature template registry
//!
//! Declared feature combinations and their interpreted ("dynamic") evaluators.
//! The dynamic evaluators define the reference semantics every compiled evaluator
//! must reproduce.

pub mod holder;
pub mod ngram;
pub mod partial;
pub mod primitive;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use holder::{FeatureHolder, FeatureSpec};
pub use ngram::{NgramDynamicFeatureApply, NgramFeature};
pub use partial::{PartialNgramDynamicFeatureApply, PartialNgramFeature};
pub use primitive::{PrimitiveFeature, PrimitiveFeatureSet};

/// The two feature kinds a generation session compiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureKind {
    /// Full ngram features over a contiguous window ending at t0
    Ngram,
    /// Features over an arbitrary subset of t0, t1 and t2
    PartialNgram,
}

impl FeatureKind {
    /// Both kinds in generation order
    pub const ALL: [FeatureKind; 2] = [FeatureKind::Ngram, FeatureKind::PartialNgram];

    /// Prefix of the generated evaluator struct name
    pub fn class_prefix(self) -> &'static str {
        match self {
            FeatureKind::Ngram => "NgramFeatureStaticApply_",
            FeatureKind::PartialNgram => "PartNgramFeatureStaticApply_",
        }
    }

    /// Evaluator trait implemented for this kind
    pub fn trait_name(self) -> &'static str {
        match self {
            FeatureKind::Ngram => "NgramFeatureApply",
            FeatureKind::PartialNgram => "PartialNgramFeatureApply",
        }
    }

    /// Name of the factory operation producing this kind
    pub fn factory_name(self) -> &'static str {
        match self {
            FeatureKind::Ngram => "ngram",
            FeatureKind::PartialNgram => "partial_ngram",
        }
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeatureKind::Ngram => write!(f, "ngram"),
            FeatureKind::PartialNgram => write!(f, "partial ngram"),
        }
    }
}
