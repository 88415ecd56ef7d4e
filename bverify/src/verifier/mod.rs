//! Verification orchestrator
//!
//! Drives one request through the pipeline:
//!
//! ```text
//! request → configuration → engine → outcome → (refuted) counterexample → report
//! ```
//!
//! Each call to [`ProgramVerifier::verify`] re-arms the state machine and
//! drops the previous outcome, so a counterexample can never be read from a
//! stale run.

use std::fmt;

use crate::config::{build_configuration, method_identifier, VerificationConfiguration, VerificationRequest};
use crate::counterexample::{build_trace, CounterexampleTrace};
use crate::engine::{CompilationContext, EngineError, SolvedModel, Verdict, VerificationEngine};
use crate::error::{Result, VerifyError};
use crate::report::{emit, Report, ReportSink};

/// Lifecycle of a verifier
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationState {
    NotStarted,
    Running,
    Proved,
    Refuted,
    Inconclusive,
}

impl VerificationState {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Proved | Self::Refuted | Self::Inconclusive)
    }
}

impl fmt::Display for VerificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not started",
            Self::Running => "running",
            Self::Proved => "proved",
            Self::Refuted => "refuted",
            Self::Inconclusive => "inconclusive",
        };
        write!(f, "{name}")
    }
}

/// Why a run could not decide the contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InconclusiveReason {
    /// The engine cannot translate a construct in use
    Unsupported(String),
    /// A construct is invalid under the contract language rules
    SemanticallyInvalid(String),
    /// The engine could not be run
    EngineUnavailable(String),
}

impl From<EngineError> for InconclusiveReason {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Unsupported(msg) => Self::Unsupported(msg),
            EngineError::Semantic(msg) => Self::SemanticallyInvalid(msg),
            EngineError::Backend(msg) => Self::EngineUnavailable(msg),
        }
    }
}

impl fmt::Display for InconclusiveReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(msg) => write!(f, "unsupported construct: {msg}"),
            Self::SemanticallyInvalid(msg) => write!(f, "semantically invalid: {msg}"),
            Self::EngineUnavailable(msg) => write!(f, "engine unavailable: {msg}"),
        }
    }
}

/// Outcome of one verification attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnalysisOutcome {
    Proved,
    Refuted {
        context: CompilationContext,
        model: SolvedModel,
    },
    Inconclusive(InconclusiveReason),
}

impl AnalysisOutcome {
    pub fn state(&self) -> VerificationState {
        match self {
            Self::Proved => VerificationState::Proved,
            Self::Refuted { .. } => VerificationState::Refuted,
            Self::Inconclusive(_) => VerificationState::Inconclusive,
        }
    }

    /// The boolean verdict: true only when the contract was proved
    pub fn is_proved(&self) -> bool {
        matches!(self, Self::Proved)
    }
}

/// A diagnostic raised while reporting
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub message: String,
}

/// Orchestrates verification of one request
pub struct ProgramVerifier<E, S> {
    request: VerificationRequest,
    engine: E,
    sink: S,
    state: VerificationState,
    outcome: Option<AnalysisOutcome>,
    diagnostics: Vec<Diagnostic>,
}

impl<E: VerificationEngine, S: ReportSink> ProgramVerifier<E, S> {
    pub fn new(request: VerificationRequest, engine: E, sink: S) -> Self {
        Self {
            request,
            engine,
            sink,
            state: VerificationState::NotStarted,
            outcome: None,
            diagnostics: Vec::new(),
        }
    }

    pub fn request(&self) -> &VerificationRequest {
        &self.request
    }

    pub fn state(&self) -> VerificationState {
        self.state
    }

    /// Outcome of the last run, `None` before the first one
    pub fn outcome(&self) -> Option<&AnalysisOutcome> {
        self.outcome.as_ref()
    }

    /// Reporting diagnostics of the last run
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn configuration(&self) -> VerificationConfiguration {
        build_configuration(&self.request)
    }

    /// Run the engine and interpret its answer, without reporting
    pub fn analyze(&mut self) -> Result<&AnalysisOutcome> {
        if self.state == VerificationState::Running {
            return Err(VerifyError::usage("verification is already running"));
        }
        self.outcome = None;
        self.diagnostics.clear();

        let subject = self.request.subject();
        if !subject.is_valid() {
            self.state = VerificationState::NotStarted;
            return Err(VerifyError::usage(format!(
                "subject '{}' is no longer well-formed",
                subject.class_name()
            )));
        }

        self.transition(VerificationState::Running);
        let configuration = build_configuration(&self.request);

        tracing::info!(
            class = %self.request.subject().class_name(),
            method = %self.request.method(),
            "running bounded verification"
        );
        let outcome = match self.engine.analyze(&configuration) {
            Ok(result) => match result.verdict {
                // a satisfiable answer without a model still refutes
                Verdict::Sat => AnalysisOutcome::Refuted {
                    context: result.context,
                    model: result.model.unwrap_or_default(),
                },
                Verdict::Unsat => AnalysisOutcome::Proved,
            },
            Err(err) => {
                let reason = InconclusiveReason::from(err);
                tracing::warn!(%reason, "verification inconclusive");
                AnalysisOutcome::Inconclusive(reason)
            }
        };
        tracing::info!(outcome = %outcome.state(), "engine finished");

        self.transition(outcome.state());
        Ok(&*self.outcome.insert(outcome))
    }

    /// Verify the request and write one report.
    ///
    /// Returns true iff the contract was proved within the bounds. A failed
    /// report write is recorded in [`diagnostics`](Self::diagnostics) and
    /// does not change the result.
    pub fn verify(&mut self) -> Result<bool> {
        let proved = self.analyze()?.is_proved();

        let report = match self.outcome.as_ref() {
            Some(AnalysisOutcome::Proved) => Report::Success,
            Some(AnalysisOutcome::Refuted { .. }) => match self.counterexample() {
                Ok(trace) => Report::Failure(trace),
                Err(err) => {
                    tracing::warn!(error = %err, "counterexample could not be recovered");
                    self.diagnostics.push(Diagnostic {
                        message: err.to_string(),
                    });
                    Report::Failure(CounterexampleTrace::default())
                }
            },
            Some(AnalysisOutcome::Inconclusive(reason)) => Report::Inconclusive(reason.to_string()),
            None => return Err(VerifyError::usage("no outcome after analysis")),
        };

        if let Err(err) = emit(&mut self.sink, &report) {
            tracing::warn!(error = %err, "an error occurred writing the verification report");
            self.diagnostics.push(Diagnostic {
                message: err.to_string(),
            });
        }

        Ok(proved)
    }

    /// Counterexample for the request's own class and method
    pub fn counterexample(&self) -> Result<CounterexampleTrace> {
        let context = match &self.outcome {
            Some(AnalysisOutcome::Refuted { context, .. }) => context,
            _ => return Err(self.not_refuted()),
        };
        self.extract_counterexample(context, self.request.subject().class_name(), self.request.method())
    }

    /// Extract the trace for `class`/`method` from the refuted run.
    ///
    /// Only callable in the `Refuted` state. A site the model has no
    /// snapshot for yields an empty trace.
    pub fn extract_counterexample(
        &self,
        context: &CompilationContext,
        class: &str,
        method: &str,
    ) -> Result<CounterexampleTrace> {
        let model = match &self.outcome {
            Some(AnalysisOutcome::Refuted { model, .. }) => model,
            _ => return Err(self.not_refuted()),
        };
        if !context.contains_class(class) {
            return Err(VerifyError::usage(format!(
                "class '{class}' is not part of the compilation context"
            )));
        }

        let trace = model
            .snapshot(context, class, &method_identifier(method))
            .map(|snapshot| build_trace(&snapshot))
            .unwrap_or_default();
        tracing::debug!(bindings = trace.len(), "counterexample extracted");
        Ok(trace)
    }

    fn not_refuted(&self) -> VerifyError {
        match self.state {
            VerificationState::NotStarted => {
                VerifyError::usage("verification must be performed to obtain a counterexample")
            }
            _ => VerifyError::usage(format!(
                "verification must fail to obtain a counterexample (state: {})",
                self.state
            )),
        }
    }

    fn transition(&mut self, next: VerificationState) {
        tracing::debug!(from = %self.state, to = %next, "state transition");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AnalysisResult;
    use crate::report::MemorySink;
    use crate::snapshot::{BindingKind, Snapshot, SnapshotValue};
    use crate::subject::AnnotatedClass;

    struct FixedEngine(Option<std::result::Result<AnalysisResult, EngineError>>);

    impl VerificationEngine for FixedEngine {
        fn analyze(&mut self, _: &VerificationConfiguration) -> std::result::Result<AnalysisResult, EngineError> {
            self.0.take().unwrap_or_else(|| Err(EngineError::Backend("exhausted".to_string())))
        }
    }

    fn request(dir: &tempfile::TempDir) -> VerificationRequest {
        std::fs::write(dir.path().join("Acc.java"), "class Acc {}").unwrap();
        let subject = AnnotatedClass::new(dir.path(), "Acc").unwrap();
        VerificationRequest::new(subject, "deposit").unwrap()
    }

    fn refuting() -> AnalysisResult {
        let mut snap = Snapshot::new();
        snap.push("amount_0", BindingKind::Parameter, SnapshotValue::literal("-1"));
        AnalysisResult::sat(
            CompilationContext::from_classes(["Acc"]),
            SolvedModel::new().with_site("Acc", "deposit_0", snap),
        )
    }

    #[test]
    fn test_initial_state() {
        let dir = tempfile::tempdir().unwrap();
        let verifier = ProgramVerifier::new(request(&dir), FixedEngine(None), MemorySink::new());
        assert_eq!(verifier.state(), VerificationState::NotStarted);
        assert!(verifier.outcome().is_none());
        assert!(verifier.counterexample().unwrap_err().is_usage_error());
    }

    #[test]
    fn test_analyze_refuted() {
        let dir = tempfile::tempdir().unwrap();
        let mut verifier = ProgramVerifier::new(request(&dir), FixedEngine(Some(Ok(refuting()))), MemorySink::new());
        let outcome = verifier.analyze().unwrap();
        assert_eq!(outcome.state(), VerificationState::Refuted);
        assert!(!outcome.is_proved());

        let trace = verifier.counterexample().unwrap();
        assert_eq!(trace.to_string(), "amount = -1\n");
    }

    #[test]
    fn test_inconclusive_reasons() {
        let cases = [
            (EngineError::Unsupported("a".to_string()), "unsupported construct: a"),
            (EngineError::Semantic("b".to_string()), "semantically invalid: b"),
            (EngineError::Backend("c".to_string()), "engine unavailable: c"),
        ];
        for (err, text) in cases {
            let dir = tempfile::tempdir().unwrap();
            let mut verifier = ProgramVerifier::new(request(&dir), FixedEngine(Some(Err(err))), MemorySink::new());
            assert!(!verifier.verify().unwrap());
            assert_eq!(verifier.state(), VerificationState::Inconclusive);
            match verifier.outcome() {
                Some(AnalysisOutcome::Inconclusive(reason)) => assert_eq!(reason.to_string(), text),
                other => panic!("unexpected outcome {other:?}"),
            }
            assert!(verifier.counterexample().is_err());
        }
    }

    #[test]
    fn test_sat_without_model_still_refutes() {
        let dir = tempfile::tempdir().unwrap();
        let result = AnalysisResult {
            verdict: Verdict::Sat,
            context: CompilationContext::from_classes(["Acc"]),
            model: None,
        };
        let mut verifier = ProgramVerifier::new(request(&dir), FixedEngine(Some(Ok(result))), MemorySink::new());
        assert!(!verifier.verify().unwrap());
        assert_eq!(verifier.state(), VerificationState::Refuted);
        assert!(verifier.counterexample().unwrap().is_empty());
    }

    #[test]
    fn test_unknown_class_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut verifier = ProgramVerifier::new(request(&dir), FixedEngine(Some(Ok(refuting()))), MemorySink::new());
        verifier.analyze().unwrap();
        let context = CompilationContext::from_classes(["Acc"]);
        let err = verifier.extract_counterexample(&context, "Other", "deposit").unwrap_err();
        assert!(err.is_usage_error());
    }

    #[test]
    fn test_invalid_subject_at_verify_time() {
        let dir = tempfile::tempdir().unwrap();
        let mut verifier = ProgramVerifier::new(request(&dir), FixedEngine(Some(Ok(refuting()))), MemorySink::new());
        std::fs::remove_file(dir.path().join("Acc.java")).unwrap();
        let err = verifier.verify().unwrap_err();
        assert!(err.is_usage_error());
        assert_eq!(verifier.state(), VerificationState::NotStarted);
    }

    #[test]
    fn test_state_display() {
        assert_eq!(VerificationState::Refuted.to_string(), "refuted");
        assert!(VerificationState::Proved.is_terminal());
        assert!(!VerificationState::Running.is_terminal());
    }
}
