use chrono::SecondsFormat;
use clap::Args;
use product_gate::config::AppConfig;
use product_gate::error::AppError;
use product_gate::pipeline::{
    parse_shape, sweep_inputs, sweep_inputs_with_threads, GoldenSet, PipelineError, QualityGate,
    RawInput, Submission, SweepInput,
};
use serde_json::Value;
use product_gate::telemetry;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Args, Debug)]
pub(crate) struct SweepArgs {
    /// Directory of RawInput JSON files, one record per file
    pub(crate) dir: PathBuf,
    /// Also write the per-record summary as CSV to this path
    #[arg(long)]
    pub(crate) csv: Option<PathBuf>,
    /// Worker threads; overrides GATE_SWEEP_THREADS
    #[arg(long)]
    pub(crate) threads: Option<usize>,
}

fn prepare() -> Result<(AppConfig, QualityGate), AppError> {
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry)?;
    let gate = QualityGate::standard()?;
    Ok((config, gate))
}

/// Text that is not JSON is a process error; JSON without the record shape
/// is structural, like any other envelope failure.
pub(crate) fn read_input(path: &Path) -> Result<RawInput, AppError> {
    let text = fs::read_to_string(path)?;
    let value: Value = serde_json::from_str(&text)?;
    Ok(parse_shape(value).map_err(PipelineError::from)?)
}

/// Every file becomes a batch item; unreadable ones are reported, not fatal.
pub(crate) fn load_sweep_inputs(dir: &Path) -> Result<Vec<SweepInput>, AppError> {
    let inputs = json_files(dir)?
        .iter()
        .map(|path| {
            let label = path
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or_default();
            match fs::read_to_string(path) {
                Ok(text) => SweepInput::from_json(label, &text),
                Err(err) => SweepInput::unreadable(label, 3, format!("IO_ERROR: {err}")),
            }
        })
        .collect();
    Ok(inputs)
}

/// `*.json` files directly under `dir`, sorted by name.
pub(crate) fn json_files(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let mut paths = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Prints the submission JSON and returns its exit code. Config and
/// structural failures propagate as errors and exit 3 and 2 respectively.
pub(crate) fn run_validate(file: &Path) -> Result<i32, AppError> {
    let (_, gate) = prepare()?;
    let input = read_input(file)?;
    let submission = gate.admit(&input)?;

    println!("{}", serde_json::to_string_pretty(&submission)?);
    let summary = match &submission {
        Submission::Evaluated(outcome) => outcome.decision.summary(),
        Submission::Fallback(_) => "built from legacy description; not verified".to_string(),
    };
    eprintln!("{} {}: {summary}", submission.label(), input.id);
    Ok(submission.exit_code())
}

pub(crate) fn run_sweep(args: SweepArgs) -> Result<i32, AppError> {
    let (config, gate) = prepare()?;
    let inputs = load_sweep_inputs(&args.dir)?;

    let threads = args.threads.unwrap_or(config.gate.sweep_threads);
    let report = if threads == 0 {
        sweep_inputs(&gate, &inputs)
    } else {
        sweep_inputs_with_threads(&gate, &inputs, threads)?
    };

    if let Some(path) = &args.csv {
        report.write_csv(BufWriter::new(File::create(path)?))?;
        info!(path = %path.display(), "sweep csv written");
    }

    for entry in &report.entries {
        let label = match (entry.is_fallback, entry.verdict) {
            (true, _) => "FALLBACK",
            (false, Some(verdict)) => verdict.label(),
            (false, None) => "FAILED",
        };
        match &entry.failure {
            Some(failure) => println!("{label:<7} {} ({failure})", entry.record_id),
            None => println!(
                "{label:<7} {} [{}] {} violation(s)",
                entry.record_id, entry.category, entry.violations
            ),
        }
    }
    println!(
        "{} records at {}: {} write, {} repair, {} reject, {} fallback, {} failed",
        report.entries.len(),
        report.generated_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        report.writes,
        report.repairs,
        report.rejects,
        report.fallbacks,
        report.failures
    );

    Ok(report.exit_code())
}

pub(crate) fn run_golden(dir: Option<PathBuf>) -> Result<i32, AppError> {
    let (config, gate) = prepare()?;
    let dir = dir.or(config.gate.golden_dir).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "no golden directory given and GATE_GOLDEN_DIR is unset",
        )
    })?;

    let set = GoldenSet::load_dir(&dir)?;
    info!(
        categories = set.categories().count(),
        dir = %dir.display(),
        "golden set loaded"
    );
    let reports = set.check_all(gate.registry())?;

    let mut drifted = 0;
    for report in &reports {
        for drift in &report.drifts {
            println!(
                "DRIFT {} {} {}: expected {} got {}",
                report.category.as_str(),
                drift.record_id,
                drift.path,
                drift.expected,
                drift.actual
            );
        }
        drifted += report.drifts.len();
        println!(
            "{}: {} snapshot(s), {} drift(s)",
            report.category.as_str(),
            report.checked,
            report.drifts.len()
        );
    }

    if drifted > 0 {
        warn!(drifts = drifted, dir = %dir.display(), "golden set drift detected");
        Ok(1)
    } else {
        Ok(0)
    }
}

pub(crate) fn run_categories() -> Result<i32, AppError> {
    let gate = QualityGate::standard()?;
    for summary in gate.registry().summaries() {
        println!(
            "{:<14} {:<10} autofill={} {}",
            summary.id.as_str(),
            summary.tier.label(),
            summary.placeholder_autofill,
            summary.label
        );
    }
    Ok(0)
}
