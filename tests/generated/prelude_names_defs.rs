// @generated by lattice-feature-codegen, do not edit.

use ::lattice_feature_codegen::hashing::{finish, mix};
use ::lattice_feature_codegen::{NgramFeatureApply, PartialNgramFeatureApply};

pub(super) fn ngram() -> Option<Box<dyn NgramFeatureApply>> {
    None
}

pub(super) fn partial_ngram() -> Option<Box<dyn PartialNgramFeatureApply>> {
    None
}
