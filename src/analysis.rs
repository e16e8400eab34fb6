//! Analysis core boundary
//!
//! [`CoreHolder`] owns the feature registry and selects, per feature kind, which
//! evaluator the scorer calls. Compiled evaluators come either from generated code
//! ([`CoreHolder::install_static`]) or from the closure backend
//! ([`CoreHolder::compile_runtime`]). A kind without a compiled evaluator keeps
//! using the interpreted one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::api::{NgramFeatureApply, PartialNgramFeatureApply, StaticFeatureFactory};
use crate::combiner::{CompiledNgramApply, CompiledPartialNgramApply, FeatureCombiner};
use crate::context::ContextWindow;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::features::{FeatureHolder, FeatureKind};

/// Analysis core settings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Number of paths kept per lattice node
    pub beam_size: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self { beam_size: 5 }
    }
}

/// Where the evaluator of a kind comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvaluatorSource {
    /// Generated code linked into the binary
    Static,
    /// Closures compiled at startup
    Runtime,
    /// Interpreted evaluator of the registry
    Dynamic,
    /// No definition registered; the kind produces no features
    Missing,
}

impl fmt::Display for EvaluatorSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvaluatorSource::Static => "static",
            EvaluatorSource::Runtime => "runtime",
            EvaluatorSource::Dynamic => "dynamic",
            EvaluatorSource::Missing => "missing",
        };
        f.write_str(name)
    }
}

/// Evaluator selection for both kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstalledEvaluators {
    /// Full ngram evaluator
    pub ngram: EvaluatorSource,
    /// Partial ngram evaluator
    pub partial_ngram: EvaluatorSource,
}

impl InstalledEvaluators {
    /// Selection for one kind
    pub fn get(&self, kind: FeatureKind) -> EvaluatorSource {
        match kind {
            FeatureKind::Ngram => self.ngram,
            FeatureKind::PartialNgram => self.partial_ngram,
        }
    }
}

/// Feature ids produced for one context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureIds {
    /// Output of the full ngram evaluator
    pub ngram: Vec<u32>,
    /// Output of the partial ngram evaluator
    pub partial_ngram: Vec<u32>,
}

/// Feature registry plus the evaluators selected for scoring
pub struct CoreHolder {
    config: CoreConfig,
    features: FeatureHolder,
    ngram: Option<Box<dyn NgramFeatureApply>>,
    partial_ngram: Option<Box<dyn PartialNgramFeatureApply>>,
    installed: InstalledEvaluators,
}

impl CoreHolder {
    /// Create a holder scoring with the interpreted evaluators
    pub fn new(config: CoreConfig, features: FeatureHolder) -> Self {
        let installed = InstalledEvaluators {
            ngram: dynamic_or_missing(features.ngram_dynamic().is_some()),
            partial_ngram: dynamic_or_missing(features.partial_ngram_dynamic().is_some()),
        };
        Self {
            config,
            features,
            ngram: None,
            partial_ngram: None,
            installed,
        }
    }

    /// Core settings
    pub fn config(&self) -> &CoreConfig {
        &self.config
    }

    /// Feature registry
    pub fn features(&self) -> &FeatureHolder {
        &self.features
    }

    /// Current evaluator selection
    pub fn installed(&self) -> InstalledEvaluators {
        self.installed
    }

    /// Take the evaluators a generated factory provides.
    ///
    /// A kind the factory returns `None` for keeps its interpreted evaluator.
    pub fn install_static(&mut self, factory: &dyn StaticFeatureFactory) -> InstalledEvaluators {
        match factory.ngram() {
            Some(evaluator) => {
                self.ngram = Some(evaluator);
                self.installed.ngram = EvaluatorSource::Static;
            }
            None => self.fall_back(FeatureKind::Ngram),
        }
        match factory.partial_ngram() {
            Some(evaluator) => {
                self.partial_ngram = Some(evaluator);
                self.installed.partial_ngram = EvaluatorSource::Static;
            }
            None => self.fall_back(FeatureKind::PartialNgram),
        }
        log::info!(
            "installed static evaluators: ngram={}, partial_ngram={}",
            self.installed.ngram,
            self.installed.partial_ngram
        );
        self.installed
    }

    /// Compile both kinds into closures; kinds that fail are reported to `sink`
    pub fn compile_runtime(
        &mut self,
        combiner: &FeatureCombiner,
        sink: &mut dyn DiagnosticSink,
    ) -> InstalledEvaluators {
        match combiner.combine(&self.features, FeatureKind::Ngram) {
            Ok(program) => {
                self.ngram = Some(Box::new(CompiledNgramApply::compile(&program)));
                self.installed.ngram = EvaluatorSource::Runtime;
            }
            Err(error) => {
                sink.report(Diagnostic::compilation_failed(FeatureKind::Ngram, &error));
                self.fall_back(FeatureKind::Ngram);
            }
        }
        match combiner.combine(&self.features, FeatureKind::PartialNgram) {
            Ok(program) => {
                self.partial_ngram = Some(Box::new(CompiledPartialNgramApply::compile(&program)));
                self.installed.partial_ngram = EvaluatorSource::Runtime;
            }
            Err(error) => {
                sink.report(Diagnostic::compilation_failed(
                    FeatureKind::PartialNgram,
                    &error,
                ));
                self.fall_back(FeatureKind::PartialNgram);
            }
        }
        self.installed
    }

    fn fall_back(&mut self, kind: FeatureKind) {
        match kind {
            FeatureKind::Ngram => {
                self.ngram = None;
                self.installed.ngram = dynamic_or_missing(self.features.ngram_dynamic().is_some());
            }
            FeatureKind::PartialNgram => {
                self.partial_ngram = None;
                self.installed.partial_ngram =
                    dynamic_or_missing(self.features.partial_ngram_dynamic().is_some());
            }
        }
        log::debug!(
            "no compiled {kind} evaluator, using {}",
            self.installed.get(kind)
        );
    }

    fn ngram_evaluator(&self) -> Option<&dyn NgramFeatureApply> {
        match &self.ngram {
            Some(evaluator) => Some(evaluator.as_ref()),
            None => self
                .features
                .ngram_dynamic()
                .map(|dynamic| dynamic as &dyn NgramFeatureApply),
        }
    }

    fn partial_ngram_evaluator(&self) -> Option<&dyn PartialNgramFeatureApply> {
        match &self.partial_ngram {
            Some(evaluator) => Some(evaluator.as_ref()),
            None => self
                .features
                .partial_ngram_dynamic()
                .map(|dynamic| dynamic as &dyn PartialNgramFeatureApply),
        }
    }

    /// Output buffer length needed by [`apply_ngram`](Self::apply_ngram)
    pub fn ngram_output_width(&self) -> usize {
        self.ngram_evaluator().map_or(0, |e| e.output_width())
    }

    /// Output buffer length needed by [`apply_partial_ngram`](Self::apply_partial_ngram)
    pub fn partial_ngram_output_width(&self) -> usize {
        self.partial_ngram_evaluator()
            .map_or(0, |e| e.output_width())
    }

    /// Write full ngram feature ids; leaves `result` untouched for a missing kind
    pub fn apply_ngram(&self, result: &mut [u32], t2: &[u64], t1: &[u64], t0: &[u64]) {
        if let Some(evaluator) = self.ngram_evaluator() {
            evaluator.apply(result, t2, t1, t0);
        }
    }

    /// Write partial ngram feature ids; leaves `result` untouched for a missing kind
    pub fn apply_partial_ngram(&self, result: &mut [u32], t2: &[u64], t1: &[u64], t0: &[u64]) {
        if let Some(evaluator) = self.partial_ngram_evaluator() {
            evaluator.apply(result, t2, t1, t0);
        }
    }

    /// Evaluate both kinds for one context into freshly allocated buffers
    pub fn evaluate(&self, context: &ContextWindow) -> FeatureIds {
        let (t2, t1, t0) = context.slices();
        let mut ids = FeatureIds {
            ngram: vec![0; self.ngram_output_width()],
            partial_ngram: vec![0; self.partial_ngram_output_width()],
        };
        self.apply_ngram(&mut ids.ngram, t2, t1, t0);
        self.apply_partial_ngram(&mut ids.partial_ngram, t2, t1, t0);
        ids
    }
}

impl fmt::Debug for CoreHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreHolder")
            .field("config", &self.config)
            .field("installed", &self.installed)
            .finish_non_exhaustive()
    }
}

fn dynamic_or_missing(defined: bool) -> EvaluatorSource {
    if defined {
        EvaluatorSource::Dynamic
    } else {
        EvaluatorSource::Missing
    }
}
