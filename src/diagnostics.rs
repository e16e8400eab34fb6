// Copyright 2024 OctoFHIR Team
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Diagnostics emitted while compiling features
//!
//! Components never log directly; they report to a [`DiagnosticSink`] passed in by
//! the caller. [`LogSink`] forwards to the `log` facade, [`DiagnosticCollector`]
//! keeps diagnostics for inspection.

use std::fmt;

use crate::error::{CodegenError, CompilationError};
use crate::features::FeatureKind;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Severity {
    /// Information about the session
    #[default]
    Info,
    /// A feature kind was skipped; generated artifacts are still valid
    Warning,
    /// The session failed
    Error,
}

/// Diagnostic codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticCode {
    /// The registry has no definition for a kind
    MissingDefinition,
    /// A definition exists but could not be compiled
    CompilationFailed,
    /// An artifact was written
    ArtifactWritten,
    /// An artifact could not be written
    WriteFailed,
}

/// A diagnostic message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Severity of the diagnostic
    pub severity: Severity,
    /// Diagnostic code
    pub code: DiagnosticCode,
    /// Feature kind the diagnostic is about, if any
    pub kind: Option<FeatureKind>,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic
    pub fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            severity,
            code,
            kind: None,
            message: message.into(),
        }
    }

    /// Warning for a feature kind that could not be compiled
    pub fn compilation_failed(kind: FeatureKind, error: &CompilationError) -> Self {
        let code = match error {
            CompilationError::MissingDefinition { .. } => DiagnosticCode::MissingDefinition,
            _ => DiagnosticCode::CompilationFailed,
        };
        Self {
            severity: Severity::Warning,
            code,
            kind: Some(kind),
            message: format!("failed to generate {kind} features: {error}"),
        }
    }

    /// Error for an artifact the session could not write
    pub fn write_failed(error: &CodegenError) -> Self {
        Self::new(
            Severity::Error,
            DiagnosticCode::WriteFailed,
            error.to_string(),
        )
    }

    /// Check if this is a warning or worse
    pub fn is_warning(&self) -> bool {
        self.severity >= Severity::Warning
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{level}: {}", self.message)
    }
}

/// Receiver of diagnostics
pub trait DiagnosticSink {
    /// Handle one diagnostic
    fn report(&mut self, diagnostic: Diagnostic);
}

/// Sink forwarding diagnostics to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity {
            Severity::Info => log::info!("{}", diagnostic.message),
            Severity::Warning => log::warn!("{}", diagnostic.message),
            Severity::Error => log::error!("{}", diagnostic.message),
        }
    }
}

/// Sink that stores every diagnostic
#[derive(Debug, Clone, Default)]
pub struct DiagnosticCollector {
    diagnostics: Vec<Diagnostic>,
}

impl DiagnosticCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Diagnostics in report order
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Diagnostics of warning severity or worse
    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter().filter(|d| d.is_warning())
    }

    /// Diagnostics about one feature kind
    pub fn for_kind(&self, kind: FeatureKind) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(move |d| d.kind == Some(kind))
    }

    /// Take the collected diagnostics, leaving the collector empty
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

impl DiagnosticSink for DiagnosticCollector {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }
}
