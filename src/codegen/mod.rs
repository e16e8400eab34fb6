//! Rust source generation for compiled feature evaluators

pub mod emitter;
pub mod static_codegen;

pub use emitter::{INDENT_WIDTH, Indent, MethodBody, Printer, Statement};
pub use static_codegen::{
    FeatureCodegenConfig, GenerationReport, RenderedSource, StaticFeatureCodegen,
};
