//! External engine process adapter
//!
//! Runs the engine as a blocking subprocess. The configuration is piped to
//! stdin as properties text, the base properties name is passed as the last
//! argument, and the engine answers with a single JSON document on stdout.

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};

use super::{AnalysisResult, CompilationContext, CompilationUnit, EngineError, SolvedModel, VerificationEngine};
use crate::config::VerificationConfiguration;
use crate::snapshot::{HeapObject, Snapshot, SnapshotEntry};

/// Snapshot of one invocation site as the engine reports it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSnapshot {
    pub class: String,
    /// Encoded method identifier, e.g. `add_0`
    pub method: String,
    #[serde(default)]
    pub entries: Vec<SnapshotEntry>,
    #[serde(default)]
    pub heap: Vec<HeapObject>,
}

/// JSON answer of the engine process
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EngineResponse {
    Unsat {
        #[serde(default)]
        units: Vec<CompilationUnit>,
    },
    Sat {
        #[serde(default)]
        units: Vec<CompilationUnit>,
        #[serde(default)]
        sites: Vec<SiteSnapshot>,
    },
    Unsupported { message: String },
    SemanticError { message: String },
}

impl EngineResponse {
    /// Parse the engine's stdout
    pub fn parse(output: &str) -> Result<Self, EngineError> {
        serde_json::from_str(output.trim())
            .map_err(|e| EngineError::Backend(format!("unreadable engine output: {e}")))
    }

    pub fn into_result(self) -> Result<AnalysisResult, EngineError> {
        match self {
            Self::Unsat { units } => Ok(AnalysisResult::unsat(CompilationContext::new(units))),
            Self::Sat { units, sites } => Ok(AnalysisResult::sat(
                CompilationContext::new(units),
                SolvedModel::from_sites(sites),
            )),
            Self::Unsupported { message } => Err(EngineError::Unsupported(message)),
            Self::SemanticError { message } => Err(EngineError::Semantic(message)),
        }
    }
}

/// Engine backed by an external command
#[derive(Debug, Clone)]
pub struct ProcessEngine {
    program: PathBuf,
    args: Vec<String>,
}

impl ProcessEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Arguments placed before the base properties name
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run(&self, configuration: &VerificationConfiguration) -> Result<String, EngineError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .arg(configuration.base_properties())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                EngineError::Backend(format!("failed to start '{}': {e}", self.program.display()))
            })?;

        {
            let mut stdin = child
                .stdin
                .take()
                .ok_or_else(|| EngineError::Backend("failed to open engine stdin".to_string()))?;
            // An engine reading its input from the properties file may close stdin early;
            // its answer is still judged by stdout and exit status.
            match stdin.write_all(configuration.to_properties().as_bytes()) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {
                    tracing::debug!("engine closed stdin before reading the properties");
                }
                Err(e) => {
                    return Err(EngineError::Backend(format!("failed to write to engine stdin: {e}")));
                }
            }
        }

        let output = child
            .wait_with_output()
            .map_err(|e| EngineError::Backend(format!("failed to wait for engine: {e}")))?;

        let stdout = String::from_utf8(output.stdout)
            .map_err(|_| EngineError::Backend("engine output is not UTF-8".to_string()))?;

        if !output.status.success() && stdout.trim().is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Backend(format!(
                "engine exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(stdout)
    }
}

impl VerificationEngine for ProcessEngine {
    fn analyze(&mut self, configuration: &VerificationConfiguration) -> Result<AnalysisResult, EngineError> {
        tracing::debug!(program = %self.program.display(), "spawning engine");
        let stdout = self.run(configuration)?;
        EngineResponse::parse(&stdout)?.into_result()
    }
}

impl SiteSnapshot {
    pub(super) fn from_snapshot(class: String, method: String, snapshot: Snapshot) -> Self {
        Self {
            class,
            method,
            entries: snapshot.entries().to_vec(),
            heap: snapshot.objects().cloned().collect(),
        }
    }

    pub(super) fn to_snapshot(&self) -> Snapshot {
        Snapshot::from_parts(self.entries.clone(), self.heap.clone())
    }
}
