//! Feature holder and its JSON specification

use serde::{Deserialize, Serialize};

use super::ngram::{NgramDynamicFeatureApply, NgramFeature};
use super::partial::{PartialNgramDynamicFeatureApply, PartialNgramFeature};
use super::primitive::{PrimitiveFeature, PrimitiveFeatureSet};
use crate::api::PrimitiveFeatureApply;
use crate::error::Result;

/// Registry of the primitive applier and both combination definitions.
///
/// Either combination may be absent. The holder is read-only while code is
/// generated from it.
pub struct FeatureHolder {
    primitive: Box<dyn PrimitiveFeatureApply>,
    ngram_dynamic: Option<NgramDynamicFeatureApply>,
    partial_ngram_dynamic: Option<PartialNgramDynamicFeatureApply>,
}

impl FeatureHolder {
    /// Create a holder without combination definitions
    pub fn new(primitive: Box<dyn PrimitiveFeatureApply>) -> Self {
        Self {
            primitive,
            ngram_dynamic: None,
            partial_ngram_dynamic: None,
        }
    }

    /// Register the full ngram combination
    pub fn with_ngram(mut self, features: Vec<NgramFeature>) -> Self {
        self.ngram_dynamic = Some(NgramDynamicFeatureApply::new(features));
        self
    }

    /// Register the partial ngram combination
    pub fn with_partial_ngram(mut self, features: Vec<PartialNgramFeature>) -> Self {
        self.partial_ngram_dynamic = Some(PartialNgramDynamicFeatureApply::new(features));
        self
    }

    /// Primitive applier producing context slices
    pub fn primitive(&self) -> &dyn PrimitiveFeatureApply {
        self.primitive.as_ref()
    }

    /// Width of every context slice
    pub fn context_width(&self) -> usize {
        self.primitive.width()
    }

    /// Interpreted full ngram evaluator, if declared
    pub fn ngram_dynamic(&self) -> Option<&NgramDynamicFeatureApply> {
        self.ngram_dynamic.as_ref()
    }

    /// Interpreted partial ngram evaluator, if declared
    pub fn partial_ngram_dynamic(&self) -> Option<&PartialNgramDynamicFeatureApply> {
        self.partial_ngram_dynamic.as_ref()
    }
}

/// Serializable description of a [`FeatureHolder`]
///
/// ```json
/// {
///   "primitive": [{"kind": "copy", "field": 0}, {"kind": "copy", "field": 1}],
///   "ngram": [{"index": 0, "arguments": [0]}, {"index": 1, "arguments": [0, 1]}],
///   "partial_ngram": [{"index": 0, "t0": 1, "t2": 1}]
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeatureSpec {
    /// Primitive features in slot order
    pub primitive: Vec<PrimitiveFeature>,
    /// Full ngram combination; absent when `null` or missing
    #[serde(default)]
    pub ngram: Option<Vec<NgramFeature>>,
    /// Partial ngram combination; absent when `null` or missing
    #[serde(default)]
    pub partial_ngram: Option<Vec<PartialNgramFeature>>,
}

impl FeatureSpec {
    /// Parse a specification from JSON text
    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Build the registry described by this specification
    pub fn into_holder(self) -> FeatureHolder {
        let mut holder = FeatureHolder::new(Box::new(PrimitiveFeatureSet::new(self.primitive)));
        if let Some(ngram) = self.ngram {
            holder = holder.with_ngram(ngram);
        }
        if let Some(partial) = self.partial_ngram {
            holder = holder.with_partial_ngram(partial);
        }
        holder
    }
}
