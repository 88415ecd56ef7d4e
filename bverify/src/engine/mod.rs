//! Bounded verification engine interface
//!
//! The engine parses the annotated sources, translates contract and program
//! to relational logic and runs the bounded model finder. This crate only
//! sees the boundary: a configuration goes in, a satisfiability verdict and
//! (when satisfiable) a solved model come out.
//!
//! - [`VerificationEngine`]: the seam implemented by engine adapters
//! - [`ProcessEngine`]: adapter running an external engine command

mod process;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::VerificationConfiguration;
use crate::snapshot::Snapshot;

pub use process::{EngineResponse, ProcessEngine, SiteSnapshot};

/// Failure raised by the engine instead of a verdict
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Construct is well-formed but the engine cannot translate it
    #[error("unsupported construct: {0}")]
    Unsupported(String),

    /// Construct is syntactically valid but semantically invalid
    #[error("semantically invalid: {0}")]
    Semantic(String),

    /// Engine could not be run or its answer could not be read
    #[error("engine unavailable: {0}")]
    Backend(String),
}

/// Satisfiability verdict. Satisfiable means a contract violation exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Sat,
    Unsat,
}

/// A source compilation unit the engine parsed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompilationUnit {
    #[serde(rename = "class")]
    pub class_name: String,
    #[serde(default)]
    pub source: Option<PathBuf>,
}

/// The compilation units of one engine run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilationContext {
    units: Vec<CompilationUnit>,
}

impl CompilationContext {
    pub fn new(units: Vec<CompilationUnit>) -> Self {
        Self { units }
    }

    /// Context listing the given classes with no source locations
    pub fn from_classes<I, S>(classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            units: classes
                .into_iter()
                .map(|c| CompilationUnit {
                    class_name: c.into(),
                    source: None,
                })
                .collect(),
        }
    }

    pub fn units(&self) -> &[CompilationUnit] {
        &self.units
    }

    pub fn contains_class(&self, class_name: &str) -> bool {
        self.units.iter().any(|u| u.class_name == class_name)
    }
}

/// Solved model of a satisfiable run, keyed by invocation site
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SolvedModel {
    sites: Vec<SiteSnapshot>,
}

impl SolvedModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the snapshot for `class`/`method_id` (the encoded method name)
    pub fn with_site(mut self, class: impl Into<String>, method_id: impl Into<String>, snapshot: Snapshot) -> Self {
        self.sites.push(SiteSnapshot::from_snapshot(class.into(), method_id.into(), snapshot));
        self
    }

    pub(crate) fn from_sites(sites: Vec<SiteSnapshot>) -> Self {
        Self { sites }
    }

    /// Recover the snapshot for an invocation site, if the model has one.
    /// Only receiver, parameter and static-field bindings are kept.
    pub fn snapshot(&self, context: &CompilationContext, class: &str, method_id: &str) -> Option<Snapshot> {
        if !context.contains_class(class) {
            return None;
        }
        self.sites
            .iter()
            .find(|s| s.class == class && s.method == method_id)
            .map(|s| s.to_snapshot().relevant())
    }
}

/// Result of one engine run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisResult {
    pub verdict: Verdict,
    pub context: CompilationContext,
    /// Present when the verdict is satisfiable
    pub model: Option<SolvedModel>,
}

impl AnalysisResult {
    pub fn unsat(context: CompilationContext) -> Self {
        Self {
            verdict: Verdict::Unsat,
            context,
            model: None,
        }
    }

    pub fn sat(context: CompilationContext, model: SolvedModel) -> Self {
        Self {
            verdict: Verdict::Sat,
            context,
            model: Some(model),
        }
    }

    pub fn is_sat(&self) -> bool {
        self.verdict == Verdict::Sat
    }

    pub fn is_unsat(&self) -> bool {
        self.verdict == Verdict::Unsat
    }
}

/// A bounded verification engine.
///
/// `analyze` blocks until the engine finishes. No cancellation is offered.
pub trait VerificationEngine {
    fn analyze(&mut self, configuration: &VerificationConfiguration) -> Result<AnalysisResult, EngineError>;
}

impl<E: VerificationEngine + ?Sized> VerificationEngine for Box<E> {
    fn analyze(&mut self, configuration: &VerificationConfiguration) -> Result<AnalysisResult, EngineError> {
        (**self).analyze(configuration)
    }
}
