//! Bounded verification driver
//!
//! Checks one method of an annotated class against its contract within
//! finite bounds, using an external analysis engine, and reports either
//! success or a readable counterexample.

pub mod config;
pub mod counterexample;
pub mod engine;
pub mod error;
pub mod report;
pub mod settings;
pub mod snapshot;
pub mod subject;
pub mod verifier;

pub use config::{build_configuration, VerificationConfiguration, VerificationRequest};
pub use counterexample::CounterexampleTrace;
pub use engine::{ProcessEngine, VerificationEngine};
pub use error::{Result, VerifyError};
pub use report::{ConsoleSink, FileSink, MemorySink, Report, ReportSink};
pub use subject::AnnotatedClass;
pub use verifier::{AnalysisOutcome, ProgramVerifier, VerificationState};
