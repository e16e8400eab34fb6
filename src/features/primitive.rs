//! Primitive features computed from dictionary entry fields

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::api::PrimitiveFeatureApply;
use crate::hashing::{SEED, mix};

/// One primitive feature, producing one slot of a context slice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrimitiveFeature {
    /// The raw value of one entry field
    Copy {
        /// Field index in the dictionary entry
        field: usize,
    },
    /// A fixed value
    Constant {
        /// Value written for every entry
        value: u64,
    },
    /// A hash of several entry fields
    Combine {
        /// Field indices, mixed in order
        fields: SmallVec<[usize; 4]>,
    },
}

impl PrimitiveFeature {
    fn compute(&self, entry: &[i32]) -> u64 {
        let field = |idx: usize| entry.get(idx).map_or(0, |&v| u64::from(v as u32));
        match self {
            PrimitiveFeature::Copy { field: idx } => field(*idx),
            PrimitiveFeature::Constant { value } => *value,
            PrimitiveFeature::Combine { fields } => fields
                .iter()
                .fold(mix(SEED, fields.len() as u64), |h, &idx| mix(h, field(idx))),
        }
    }
}

/// Ordered set of primitive features; slot `i` of a context slice holds feature `i`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrimitiveFeatureSet {
    features: Vec<PrimitiveFeature>,
}

impl PrimitiveFeatureSet {
    /// Create a set from its features in slot order
    pub fn new(features: Vec<PrimitiveFeature>) -> Self {
        Self { features }
    }

    /// Features in slot order
    pub fn features(&self) -> &[PrimitiveFeature] {
        &self.features
    }
}

impl PrimitiveFeatureApply for PrimitiveFeatureSet {
    fn width(&self) -> usize {
        self.features.len()
    }

    fn apply(&self, entry: &[i32], out: &mut [u64]) {
        for (slot, feature) in out.iter_mut().zip(&self.features) {
            *slot = feature.compute(entry);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    #[test]
    fn test_apply_fills_slots_in_order() {
        let set = PrimitiveFeatureSet::new(vec![
            PrimitiveFeature::Copy { field: 1 },
            PrimitiveFeature::Constant { value: 42 },
            PrimitiveFeature::Copy { field: 5 },
        ]);
        let mut out = [0u64; 3];
        set.apply(&[10, 20], &mut out);

        // missing fields read as zero
        assert_eq!(out, [20, 42, 0]);
    }

    #[test]
    fn test_combine_depends_on_field_order() {
        let ab = PrimitiveFeature::Combine {
            fields: smallvec![0, 1],
        };
        let ba = PrimitiveFeature::Combine {
            fields: smallvec![1, 0],
        };
        assert_ne!(ab.compute(&[3, 4]), ba.compute(&[3, 4]));
        assert_eq!(ab.compute(&[3, 4]), ba.compute(&[4, 3]));
    }

    #[test]
    fn test_deserialize_tagged_features() {
        let json = r#"[
            {"kind": "copy", "field": 0},
            {"kind": "constant", "value": 3},
            {"kind": "combine", "fields": [0, 2]}
        ]"#;
        let features: Vec<PrimitiveFeature> = serde_json::from_str(json).unwrap();
        assert_eq!(features.len(), 3);
        assert_eq!(features[1], PrimitiveFeature::Constant { value: 3 });
    }
}
