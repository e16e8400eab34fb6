// @generated by lattice-feature-codegen, do not edit.

use ::lattice_feature_codegen::hashing::{finish, mix};
use ::lattice_feature_codegen::{NgramFeatureApply, PartialNgramFeatureApply};

struct NgramFeatureStaticApply_SampleFeatures;

impl NgramFeatureApply for NgramFeatureStaticApply_SampleFeatures {
    fn output_width(&self) -> usize {
        3
    }

    #[inline(always)]
    fn apply(&self, result: &mut [u32], t2: &[u64], t1: &[u64], t0: &[u64]) {
        debug_assert!(result.len() >= 3);
        let t0_0 = t0[0];
        let t0_1 = t0[1];
        let t0_2 = t0[2];
        let t1_0 = t1[0];
        let t1_1 = t1[1];
        let t2_0 = t2[0];
        result[0] = finish(mix(0x7449c710966bc3e9, t0_0));
        result[1] = finish(mix(mix(0xf3248cb3f8ca936c, t0_1), t1_0));
        result[2] = finish(mix(mix(mix(0x3a634059dbfbbc3a, t0_2), t1_1), t2_0));
    }
}

struct PartNgramFeatureStaticApply_SampleFeatures;

impl PartialNgramFeatureApply for PartNgramFeatureStaticApply_SampleFeatures {
    fn output_width(&self) -> usize {
        2
    }

    #[inline(always)]
    fn apply(&self, result: &mut [u32], t2: &[u64], t1: &[u64], t0: &[u64]) {
        debug_assert!(result.len() >= 2);
        let t0_0 = t0[0];
        let t1_2 = t1[2];
        let t2_1 = t2[1];
        result[0] = finish(mix(mix(0x1fe0ae856cea1588, t0_0), t2_1));
        result[1] = finish(mix(0x44d464a391d8e6c2, t1_2));
    }
}

pub(super) fn ngram() -> Option<Box<dyn NgramFeatureApply>> {
    Some(Box::new(NgramFeatureStaticApply_SampleFeatures))
}

pub(super) fn partial_ngram() -> Option<Box<dyn PartialNgramFeatureApply>> {
    Some(Box::new(PartNgramFeatureStaticApply_SampleFeatures))
}
