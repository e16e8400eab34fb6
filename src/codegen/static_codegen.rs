//! Static code generation session
//!
//! A session writes two artifacts into the configured directory:
//!
//! - `<filename>.rs`, the declaration: a unit struct implementing
//!   [`StaticFeatureFactory`](crate::StaticFeatureFactory) whose two operations
//!   delegate to the definitions module
//! - `<filename>_defs.rs`, the definition: one private evaluator struct per
//!   compiled feature kind and the two factory functions
//!
//! The declaration only depends on the session configuration. A consumer links
//! the result with `include!(concat!(env!("OUT_DIR"), "/<filename>.rs"));`.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;

use super::emitter::{MethodBody, Printer};
use crate::combiner::ir::APPLY_SIGNATURE;
use crate::combiner::{CombinerConfig, FeatureCombiner, FeatureProgram};
use crate::diagnostics::{Diagnostic, DiagnosticCode, DiagnosticSink, Severity};
use crate::error::{CodegenError, Result};
use crate::features::{FeatureHolder, FeatureKind};

/// Crate path generated code refers to
pub const CRATE_PATH: &str = "::lattice_feature_codegen";

/// Paths the declaration uses for prelude types; the factory struct may shadow their names
const OPTION_PATH: &str = "::std::option::Option";
const BOX_PATH: &str = "::std::boxed::Box";

/// Suffix appended to the file name for the definition artifact
pub const DEFINITION_SUFFIX: &str = "_defs";

/// Extension of both artifacts
pub const ARTIFACT_EXTENSION: &str = "rs";

const GENERATED_BANNER: &str = "// @generated by lattice-feature-codegen, do not edit.";

const RESERVED_WORDS: &[&str] = &[
    "Self", "abstract", "as", "async", "await", "become", "box", "break", "const", "continue",
    "crate", "do", "dyn", "else", "enum", "extern", "false", "final", "fn", "for", "gen", "if",
    "impl", "in", "let", "loop", "macro", "match", "mod", "move", "mut", "override", "priv", "pub",
    "ref", "return", "self", "static", "struct", "super", "trait", "true", "try", "type", "typeof",
    "unsafe", "unsized", "use", "virtual", "where", "while", "yield",
];

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
    valid_start
        && name != "_"
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !RESERVED_WORDS.contains(&name)
}

/// Where and under which names a session writes its artifacts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureCodegenConfig {
    /// Output directory; must exist
    pub base_directory: PathBuf,
    /// Base name of both artifacts, also used for the definitions module
    pub filename: String,
    /// Name of the generated factory struct
    pub class_name: String,
}

impl FeatureCodegenConfig {
    /// Create a configuration
    pub fn new(
        base_directory: impl Into<PathBuf>,
        filename: impl Into<String>,
        class_name: impl Into<String>,
    ) -> Self {
        Self {
            base_directory: base_directory.into(),
            filename: filename.into(),
            class_name: class_name.into(),
        }
    }

    /// Check that both names produce valid Rust items
    pub fn validate(&self) -> Result<()> {
        if !is_identifier(&self.class_name) {
            return Err(CodegenError::invalid_config(format!(
                "class name {:?} is not a valid identifier",
                self.class_name
            )));
        }
        if !is_identifier(&self.filename) {
            return Err(CodegenError::invalid_config(format!(
                "file name {:?} is not a valid identifier",
                self.filename
            )));
        }
        if self.class_name == self.definitions_module() {
            return Err(CodegenError::invalid_config(format!(
                "class name {:?} collides with the definitions module",
                self.class_name
            )));
        }
        Ok(())
    }

    /// Path of the declaration artifact
    pub fn declaration_path(&self) -> PathBuf {
        self.base_directory
            .join(format!("{}.{ARTIFACT_EXTENSION}", self.filename))
    }

    /// Path of the definition artifact
    pub fn definition_path(&self) -> PathBuf {
        self.base_directory.join(self.definition_file_name())
    }

    /// File name of the definition artifact, as referenced by the declaration
    pub fn definition_file_name(&self) -> String {
        format!("{}{DEFINITION_SUFFIX}.{ARTIFACT_EXTENSION}", self.filename)
    }

    /// Module the definition artifact is included into
    pub fn definitions_module(&self) -> String {
        format!("{}{DEFINITION_SUFFIX}", self.filename)
    }

    /// Name of the generated evaluator struct for `kind`
    pub fn evaluator_name(&self, kind: FeatureKind) -> String {
        format!("{}{}", kind.class_prefix(), self.class_name)
    }
}

/// Outcome of a successful session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    /// Declaration artifact written
    pub declaration: PathBuf,
    /// Definition artifact written
    pub definition: PathBuf,
    /// Whether the ngram evaluator was compiled
    pub ngram: bool,
    /// Whether the partial ngram evaluator was compiled
    pub partial_ngram: bool,
}

impl GenerationReport {
    /// Whether `kind` was compiled
    pub fn compiled(&self, kind: FeatureKind) -> bool {
        match kind {
            FeatureKind::Ngram => self.ngram,
            FeatureKind::PartialNgram => self.partial_ngram,
        }
    }

    /// Whether both kinds were compiled
    pub fn is_complete(&self) -> bool {
        self.ngram && self.partial_ngram
    }
}

/// Rendered definition artifact and the kinds it contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSource {
    /// Artifact text
    pub text: String,
    /// Whether the ngram evaluator was compiled
    pub ngram: bool,
    /// Whether the partial ngram evaluator was compiled
    pub partial_ngram: bool,
}

/// One generation session
///
/// Not meant to run concurrently with another session targeting the same paths.
#[derive(Debug, Clone)]
pub struct StaticFeatureCodegen {
    config: FeatureCodegenConfig,
    combiner: FeatureCombiner,
}

impl StaticFeatureCodegen {
    /// Start a session; fails on a malformed configuration
    pub fn new(config: FeatureCodegenConfig) -> Result<Self> {
        Self::with_combiner(config, CombinerConfig::default())
    }

    /// Start a session with custom combiner settings
    pub fn with_combiner(config: FeatureCodegenConfig, combiner: CombinerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            combiner: FeatureCombiner::with_config(combiner),
        })
    }

    /// Session configuration
    pub fn config(&self) -> &FeatureCodegenConfig {
        &self.config
    }

    /// Write the declaration, then the definition.
    ///
    /// The definition is not attempted when the declaration fails. Kinds that do not
    /// compile are reported to `sink` and do not fail the session; a failed write is
    /// reported as an error and returned.
    pub fn generate_and_write(
        &self,
        features: &FeatureHolder,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<GenerationReport> {
        let declaration = self.config.declaration_path();
        self.write_header(&declaration)
            .inspect_err(|e| sink.report(Diagnostic::write_failed(e)))?;
        sink.report(written(&declaration));

        let definition = self.config.definition_path();
        let source = self
            .write_source(&definition, features, sink)
            .inspect_err(|e| sink.report(Diagnostic::write_failed(e)))?;
        sink.report(written(&definition));

        Ok(GenerationReport {
            declaration,
            definition,
            ngram: source.ngram,
            partial_ngram: source.partial_ngram,
        })
    }

    /// Write the declaration artifact to `path`
    pub fn write_header(&self, path: &Path) -> Result<()> {
        write_artifact(path, &self.render_header())
    }

    /// Write the definition artifact to `path`
    pub fn write_source(
        &self,
        path: &Path,
        features: &FeatureHolder,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<RenderedSource> {
        let source = self.render_source(features, sink);
        write_artifact(path, &source.text)?;
        Ok(source)
    }

    /// Text of the declaration artifact
    pub fn render_header(&self) -> String {
        let class = &self.config.class_name;
        let module = self.config.definitions_module();

        let mut p = Printer::new();
        p.line(GENERATED_BANNER).blank();
        p.line(&format!("pub struct {class};")).blank();

        let mut factory = MethodBody::new();
        for (i, kind) in FeatureKind::ALL.into_iter().enumerate() {
            if i > 0 {
                factory.blank();
            }
            factory.block_with(
                format!(
                    "fn {}(&self) -> {OPTION_PATH}<{BOX_PATH}<dyn {CRATE_PATH}::{}>> {{",
                    kind.factory_name(),
                    kind.trait_name()
                ),
                "}",
                |b| {
                    b.line(format!("{module}::{}()", kind.factory_name()));
                },
            );
        }
        let mut body = MethodBody::new();
        body.block(
            format!("impl {CRATE_PATH}::StaticFeatureFactory for {class} {{"),
            "}",
            factory,
        );
        p.emit(&body).blank();

        p.line("#[allow(non_camel_case_types, unused_imports, unused_variables, dead_code)]");
        p.line(&format!("mod {module} {{"));
        {
            let mut inner = p.indent();
            inner.line(&format!(
                "include!(\"{}\");",
                self.config.definition_file_name()
            ));
        }
        p.line("}");
        p.into_result()
    }

    /// Text of the definition artifact; compilation failures go to `sink`
    pub fn render_source(
        &self,
        features: &FeatureHolder,
        sink: &mut dyn DiagnosticSink,
    ) -> RenderedSource {
        let mut p = Printer::new();
        p.line(GENERATED_BANNER).blank();
        p.line(&format!("use {CRATE_PATH}::hashing::{{finish, mix}};"));
        p.line(&format!(
            "use {CRATE_PATH}::{{NgramFeatureApply, PartialNgramFeatureApply}};"
        ));

        let ngram_name = self.config.evaluator_name(FeatureKind::Ngram);
        let ngram_ok = match self.program(features, FeatureKind::Ngram, sink) {
            Some(program) => {
                output_ngram_features(&mut p, &ngram_name, &program);
                true
            }
            None => false,
        };

        let partial_name = self.config.evaluator_name(FeatureKind::PartialNgram);
        let partial_ok = match self.program(features, FeatureKind::PartialNgram, sink) {
            Some(program) => {
                output_partial_ngram_features(&mut p, &partial_name, &program);
                true
            }
            None => false,
        };

        output_factory(&mut p, FeatureKind::Ngram, ngram_ok.then_some(&ngram_name));
        output_factory(
            &mut p,
            FeatureKind::PartialNgram,
            partial_ok.then_some(&partial_name),
        );

        let text = p.into_result();
        log::debug!(
            "rendered {} definitions: {} bytes, ngram={ngram_ok}, partial_ngram={partial_ok}",
            self.config.class_name,
            text.len()
        );
        RenderedSource {
            text,
            ngram: ngram_ok,
            partial_ngram: partial_ok,
        }
    }

    fn program(
        &self,
        features: &FeatureHolder,
        kind: FeatureKind,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<FeatureProgram> {
        match self.combiner.combine(features, kind) {
            Ok(program) => Some(program),
            Err(error) => {
                sink.report(Diagnostic::compilation_failed(kind, &error));
                None
            }
        }
    }
}

fn output_ngram_features(p: &mut Printer, name: &str, program: &FeatureProgram) {
    let mut apply = MethodBody::new();
    program.emit_code(&mut apply);

    p.blank();
    p.line(&format!("struct {name};")).blank();
    p.line(&format!(
        "impl {} for {name} {{",
        FeatureKind::Ngram.trait_name()
    ));
    {
        let mut class = p.indent();
        class.line("fn output_width(&self) -> usize {");
        class.indent().line(&program.output_width().to_string());
        class.line("}").blank();
        class.line("#[inline(always)]");
        class.line(APPLY_SIGNATURE);
        class.indent().emit(&apply);
        class.line("}");
    }
    p.line("}");
}

fn output_partial_ngram_features(p: &mut Printer, name: &str, program: &FeatureProgram) {
    p.blank();
    p.line(&format!("struct {name};")).blank();
    p.line(&format!(
        "impl {} for {name} {{",
        FeatureKind::PartialNgram.trait_name()
    ));
    {
        let mut class = p.indent();
        program.output_class_body(&mut class);
    }
    p.line("}");
}

fn output_factory(p: &mut Printer, kind: FeatureKind, evaluator: Option<&String>) {
    p.blank();
    p.line(&format!(
        "pub(super) fn {}() -> Option<Box<dyn {}>> {{",
        kind.factory_name(),
        kind.trait_name()
    ));
    let constructed = match evaluator {
        Some(name) => format!("Some(Box::new({name}))"),
        None => "None".to_string(),
    };
    p.indent().line(&constructed);
    p.line("}");
}

fn written(path: &Path) -> Diagnostic {
    Diagnostic::new(
        Severity::Info,
        DiagnosticCode::ArtifactWritten,
        format!("wrote {}", path.display()),
    )
}

/// Write `contents` to a temporary file next to `path` and rename it into place
fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut file = NamedTempFile::new_in(directory).map_err(|e| CodegenError::io(path, e))?;
    file.write_all(contents.as_bytes())
        .map_err(|e| CodegenError::io(path, e))?;
    file.persist(path)
        .map_err(|e| CodegenError::io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticCollector;
    use crate::features::{NgramFeature, PrimitiveFeature, PrimitiveFeatureSet};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn holder() -> FeatureHolder {
        FeatureHolder::new(Box::new(PrimitiveFeatureSet::new(vec![
            PrimitiveFeature::Copy { field: 0 },
        ])))
        .with_ngram(vec![NgramFeature::bigram(0, 0, 0)])
    }

    fn codegen() -> StaticFeatureCodegen {
        StaticFeatureCodegen::new(FeatureCodegenConfig::new("out", "features", "Generated"))
            .unwrap()
    }

    #[rstest]
    #[case("", "features")]
    #[case("Generated", "")]
    #[case("9Lives", "features")]
    #[case("Generated", "my-features")]
    #[case("Self", "features")]
    #[case("_", "features")]
    fn test_invalid_config(#[case] class_name: &str, #[case] filename: &str) {
        let err = StaticFeatureCodegen::new(FeatureCodegenConfig::new("out", filename, class_name))
            .unwrap_err();
        assert!(matches!(err, CodegenError::InvalidConfig { .. }), "{err}");
    }

    #[test]
    fn test_class_name_must_differ_from_definitions_module() {
        let config = FeatureCodegenConfig::new("out", "features", "features_defs");
        let err = StaticFeatureCodegen::new(config).unwrap_err();
        assert!(err.to_string().contains("collides with the definitions module"));
    }

    #[rstest]
    #[case("Option")]
    #[case("Box")]
    #[case("Some")]
    #[case("Vec")]
    fn test_prelude_class_names_use_absolute_paths(#[case] class_name: &str) {
        let config = FeatureCodegenConfig::new("out", "features", class_name);
        let header = StaticFeatureCodegen::new(config).unwrap().render_header();

        assert!(header.contains(&format!("pub struct {class_name};")));
        let signatures = header.matches("-> ::std::option::Option<::std::boxed::Box<dyn ");
        assert_eq!(signatures.count(), 2);
        assert!(!header.contains(" Option<Box<"));
    }

    #[test]
    fn test_artifact_paths() {
        let config = FeatureCodegenConfig::new("out", "features", "Generated");
        assert_eq!(config.declaration_path(), Path::new("out/features.rs"));
        assert_eq!(config.definition_path(), Path::new("out/features_defs.rs"));
        assert_eq!(config.definitions_module(), "features_defs");
        assert_eq!(
            config.evaluator_name(FeatureKind::Ngram),
            "NgramFeatureStaticApply_Generated"
        );
        assert_eq!(
            config.evaluator_name(FeatureKind::PartialNgram),
            "PartNgramFeatureStaticApply_Generated"
        );
    }

    #[test]
    fn test_render_header() {
        let expected = "\
// @generated by lattice-feature-codegen, do not edit.

pub struct Generated;

impl ::lattice_feature_codegen::StaticFeatureFactory for Generated {
    fn ngram(&self) -> ::std::option::Option<::std::boxed::Box<dyn ::lattice_feature_codegen::NgramFeatureApply>> {
        features_defs::ngram()
    }

    fn partial_ngram(&self) -> ::std::option::Option<::std::boxed::Box<dyn ::lattice_feature_codegen::PartialNgramFeatureApply>> {
        features_defs::partial_ngram()
    }
}

#[allow(non_camel_case_types, unused_imports, unused_variables, dead_code)]
mod features_defs {
    include!(\"features_defs.rs\");
}
";
        assert_eq!(codegen().render_header(), expected);
    }

    #[test]
    fn test_render_source_without_partial() {
        let mut sink = DiagnosticCollector::new();
        let source = codegen().render_source(&holder(), &mut sink);

        assert!(source.ngram);
        assert!(!source.partial_ngram);
        assert!(source.text.contains("struct NgramFeatureStaticApply_Generated;"));
        assert!(!source.text.contains("struct PartNgramFeatureStaticApply_Generated;"));
        let ngram_factory = "pub(super) fn ngram() -> Option<Box<dyn NgramFeatureApply>> {\n    \
                             Some(Box::new(NgramFeatureStaticApply_Generated))\n}";
        let partial_factory =
            "pub(super) fn partial_ngram() -> Option<Box<dyn PartialNgramFeatureApply>> {\n    \
             None\n}";
        assert!(source.text.contains(ngram_factory));
        assert!(source.text.contains(partial_factory));
        assert!(source.text.contains("        let t0_0 = t0[0];\n"));

        let warnings: Vec<_> = sink.warnings().collect();
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].code, DiagnosticCode::MissingDefinition);
        assert_eq!(warnings[0].kind, Some(FeatureKind::PartialNgram));
    }

    #[test]
    fn test_ngram_class_layout() {
        let mut sink = DiagnosticCollector::new();
        let source = codegen().render_source(&holder(), &mut sink);

        let start = source.text.find("impl NgramFeatureApply").unwrap();
        let class: Vec<&str> = source.text[start..].lines().take(8).collect();
        assert_eq!(
            class,
            vec![
                "impl NgramFeatureApply for NgramFeatureStaticApply_Generated {",
                "    fn output_width(&self) -> usize {",
                "        1",
                "    }",
                "",
                "    #[inline(always)]",
                "    fn apply(&self, result: &mut [u32], t2: &[u64], t1: &[u64], t0: &[u64]) {",
                "        debug_assert!(result.len() >= 1);",
            ]
        );
    }
}
