//! Bounded verification CLI

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::Level;

use bverify::settings::{load_settings, Settings};
use bverify::{
    build_configuration, AnnotatedClass, ConsoleSink, FileSink, ProcessEngine, ProgramVerifier, ReportSink,
    VerificationRequest,
};

#[derive(Parser)]
#[command(name = "bverify", version, about = "Bounded contract verification of a single method")]
struct Cli {
    /// Root folder of the sources
    #[arg(short = 'p', long = "path")]
    path: PathBuf,

    /// Fully qualified name of the class under analysis
    #[arg(short = 'c', long = "class-name")]
    class_name: String,

    /// Method to check
    #[arg(short = 'm', long)]
    method: String,

    /// Type scopes handed to the engine
    #[arg(short = 's', long)]
    scope: Option<String>,

    /// Additional classes needed by the analysis
    #[arg(short = 'n', long = "needed-classes", value_delimiter = ',')]
    needed_classes: Vec<String>,

    /// Settings file (defaults to ./bverify.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Engine command, overrides the settings file
    #[arg(long)]
    engine: Option<String>,

    /// Report file, overrides the settings file
    #[arg(long)]
    report: Option<PathBuf>,

    /// Print the report to stdout instead of writing a file
    #[arg(long)]
    console: bool,

    /// Print the engine properties and exit
    #[arg(long)]
    dry_run: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    verbose: u8,
}

/// Exit status for a proved contract
const EXIT_PROVED: u8 = 0;
/// Exit status for a refuted or inconclusive run
const EXIT_NOT_PROVED: u8 = 1;
/// Exit status for construction, settings or usage errors
const EXIT_ERROR: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let result = run(cli, &mut std::io::stdout());
    if let Err(e) = &result {
        eprintln!("Error: {e}");
    }
    ExitCode::from(exit_status(&result))
}

fn exit_status(result: &Result<bool, Box<dyn std::error::Error>>) -> u8 {
    match result {
        Ok(true) => EXIT_PROVED,
        Ok(false) => EXIT_NOT_PROVED,
        Err(_) => EXIT_ERROR,
    }
}

/// Run one verification. `out` receives the properties text on a dry run.
fn run(cli: Cli, out: &mut dyn Write) -> Result<bool, Box<dyn std::error::Error>> {
    let mut settings = load_settings(cli.config.as_deref())?;
    apply_overrides(&mut settings, &cli);

    let subject = AnnotatedClass::new(&cli.path, &cli.class_name)?;
    let mut request = VerificationRequest::new(subject, &cli.method)?.with_dependencies(cli.needed_classes.iter());
    if let Some(scope) = &cli.scope {
        request = request.with_scope(scope.as_str());
    }

    if cli.dry_run {
        out.write_all(build_configuration(&request).to_properties().as_bytes())?;
        return Ok(true);
    }

    let engine = ProcessEngine::new(&settings.engine.command).with_args(settings.engine.args.iter());
    let sink: Box<dyn ReportSink> = if settings.report.console {
        Box::new(ConsoleSink)
    } else {
        Box::new(FileSink::new(&settings.report.path))
    };

    let mut verifier = ProgramVerifier::new(request, engine, sink);
    let proved = verifier.verify()?;
    for diagnostic in verifier.diagnostics() {
        eprintln!("warning: {}", diagnostic.message);
    }
    Ok(proved)
}

/// Command-line flags take precedence over the settings file
fn apply_overrides(settings: &mut Settings, cli: &Cli) {
    if let Some(engine) = &cli.engine {
        settings.engine.command = engine.clone();
    }
    if let Some(report) = &cli.report {
        settings.report.path = report.clone();
    }
    if cli.console {
        settings.report.console = true;
    }
}
