//! Verification reports
//!
//! A [`Report`] is rendered once per verification attempt and handed to a
//! [`ReportSink`]. Sink failures surface as [`ReportError`]; callers log
//! them and keep the verdict.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::counterexample::CounterexampleTrace;

/// Default report file name
pub const DEFAULT_REPORT_FILE: &str = "verification-result.txt";

pub const SUCCESS_LINE: &str = "VERIFICATION SUCCEEDED: No errors found.";
pub const FAILURE_LINE: &str =
    "VERIFICATION FAILED: Program does not satisfy its contract in the following situation:";
pub const INCONCLUSIVE_PREFIX: &str = "VERIFICATION INCONCLUSIVE:";

/// Report emission failure
#[derive(Debug, Error)]
#[error("failed to write report to {target}: {source}")]
pub struct ReportError {
    pub target: String,
    #[source]
    pub source: io::Error,
}

/// Content of a verification report
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    Success,
    Failure(CounterexampleTrace),
    Inconclusive(String),
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success => writeln!(f, "{SUCCESS_LINE}"),
            Self::Failure(trace) => {
                writeln!(f, "{FAILURE_LINE}")?;
                write!(f, "{trace}")
            }
            Self::Inconclusive(reason) => writeln!(f, "{INCONCLUSIVE_PREFIX} {reason}"),
        }
    }
}

/// Destination for reports
pub trait ReportSink {
    /// Write one complete report
    fn write_report(&mut self, text: &str) -> io::Result<()>;

    /// Human-readable target, used in diagnostics
    fn target(&self) -> String;
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn write_report(&mut self, text: &str) -> io::Result<()> {
        (**self).write_report(text)
    }

    fn target(&self) -> String {
        (**self).target()
    }
}

/// Writes the report to a file, replacing earlier contents
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileSink {
    fn default() -> Self {
        Self::new(DEFAULT_REPORT_FILE)
    }
}

impl ReportSink for FileSink {
    fn write_report(&mut self, text: &str) -> io::Result<()> {
        let mut file = File::create(&self.path)?;
        file.write_all(text.as_bytes())?;
        file.flush()
    }

    fn target(&self) -> String {
        self.path.display().to_string()
    }
}

/// Writes the report to standard output
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleSink;

impl ReportSink for ConsoleSink {
    fn write_report(&mut self, text: &str) -> io::Result<()> {
        let stdout = io::stdout();
        let mut lock = stdout.lock();
        lock.write_all(text.as_bytes())?;
        lock.flush()
    }

    fn target(&self) -> String {
        "stdout".to_string()
    }
}

/// Keeps reports in memory
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    reports: Vec<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reports(&self) -> &[String] {
        &self.reports
    }

    pub fn last(&self) -> Option<&str> {
        self.reports.last().map(String::as_str)
    }
}

impl ReportSink for MemorySink {
    fn write_report(&mut self, text: &str) -> io::Result<()> {
        self.reports.push(text.to_string());
        Ok(())
    }

    fn target(&self) -> String {
        "memory".to_string()
    }
}

/// Render a report and write it to the sink in one scoped write
pub fn emit<S: ReportSink + ?Sized>(sink: &mut S, report: &Report) -> Result<(), ReportError> {
    let text = report.to_string();
    sink.write_report(&text).map_err(|source| ReportError {
        target: sink.target(),
        source,
    })?;
    tracing::info!(target_sink = %sink.target(), "report written");
    Ok(())
}
