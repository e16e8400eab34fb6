// @generated by lattice-feature-codegen, do not edit.

pub struct SampleFeatures;

impl ::lattice_feature_codegen::StaticFeatureFactory for SampleFeatures {
    fn ngram(&self) -> ::std::option::Option<::std::boxed::Box<dyn ::lattice_feature_codegen::NgramFeatureApply>> {
        sample_features_defs::ngram()
    }

    fn partial_ngram(&self) -> ::std::option::Option<::std::boxed::Box<dyn ::lattice_feature_codegen::PartialNgramFeatureApply>> {
        sample_features_defs::partial_ngram()
    }
}

#[allow(non_camel_case_types, unused_imports, unused_variables, dead_code)]
mod sample_features_defs {
    include!("sample_features_defs.rs");
}
