// @generated by lattice-feature-codegen, do not edit.

pub struct Option;

impl ::lattice_feature_codegen::StaticFeatureFactory for Option {
    fn ngram(&self) -> ::std::option::Option<::std::boxed::Box<dyn ::lattice_feature_codegen::NgramFeatureApply>> {
        prelude_names_defs::ngram()
    }

    fn partial_ngram(&self) -> ::std::option::Option<::std::boxed::Box<dyn ::lattice_feature_codegen::PartialNgramFeatureApply>> {
        prelude_names_defs::partial_ngram()
    }
}

#[allow(non_camel_case_types, unused_imports, unused_variables, dead_code)]
mod prelude_names_defs {
    include!("prelude_names_defs.rs");
}
