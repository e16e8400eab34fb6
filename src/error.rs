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

//! Error types for feature compilation
//!
//! Two families exist. [`CompilationError`] describes why one feature kind could not
//! be turned into IR; it is absorbed by the code generator and becomes an
//! "unavailable" factory result. [`CodegenError`] is terminal for a generation
//! session and is returned to the caller.

use std::path::PathBuf;

use thiserror::Error;

use crate::context::Position;
use crate::features::FeatureKind;

/// Result type alias for session-level operations
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Result type alias for IR construction
pub type CompilationResult<T> = std::result::Result<T, CompilationError>;

/// Terminal failures of a generation session
#[derive(Error, Debug)]
pub enum CodegenError {
    /// An artifact could not be created or written
    #[error("failed to generate {}: {source}", path.display())]
    Io {
        /// Artifact path the session was writing
        path: PathBuf,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },

    /// The session configuration cannot produce valid artifacts
    #[error("invalid codegen configuration: {message}")]
    InvalidConfig {
        /// Human-readable description of the problem
        message: String,
    },

    /// A feature specification document could not be read
    #[error("invalid feature specification: {0}")]
    Spec(#[from] serde_json::Error),
}

impl CodegenError {
    /// Wrap an I/O error with the artifact path it occurred on
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Create a configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Path of the artifact this error refers to, if any
    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Self::Io { path, .. } => Some(path),
            _ => None,
        }
    }
}

/// Reasons a single feature kind cannot be compiled
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CompilationError {
    /// The registry holds no definition for this kind
    #[error("no {kind} definition is registered")]
    MissingDefinition {
        /// Feature kind that is absent
        kind: FeatureKind,
    },

    /// An ngram feature reads an unsupported number of positions
    #[error("feature {feature} combines {arity} positions, expected 1 to 3")]
    UnsupportedArity {
        /// Target index of the feature
        feature: u32,
        /// Number of arguments declared
        arity: usize,
    },

    /// A partial ngram feature reads no position at all
    #[error("partial feature {feature} does not read any position")]
    EmptyFeature {
        /// Target index of the feature
        feature: u32,
    },

    /// A feature reads a slot outside the context slice
    #[error("feature {feature} reads {position}[{slot}] but context width is {width}")]
    SlotOutOfRange {
        /// Target index of the feature
        feature: u32,
        /// Position the slot is read from
        position: Position,
        /// Requested slot
        slot: u32,
        /// Declared context slice width
        width: usize,
    },

    /// Two features write the same output index
    #[error("output index {target} is written by more than one feature")]
    DuplicateTarget {
        /// Output index written twice
        target: u32,
    },
}
