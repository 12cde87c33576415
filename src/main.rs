//! `mnpi-scan`: scan a document for Material Non-Public Information
//! using a locally hosted Ollama model.
//!
//! The exit code is the verdict, so the binary drops into shell scripts
//! and pre-send hooks without parsing output.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use mnpi_scan::config::{self, ScanConfig};
use mnpi_scan::{
    resolve_model, ClassifyError, DocumentScanner, OllamaClient, RecommendedAction, ScanReport,
};

/// Process exit codes. Scripts branch on these.
mod exit_codes {
    /// Scan finished; nothing to act on.
    pub const NO_ACTION: i32 = 0;
    /// The scan itself failed (bad input, Ollama unreachable).
    pub const FAILURE: i32 = 1;
    /// Scan finished; a human should look at the document.
    pub const HUMAN_REVIEW: i32 = 2;
    /// Scan finished; confident MNPI finding, escalate.
    pub const ESCALATE: i32 = 3;
}

#[derive(Debug, Parser)]
#[command(name = "mnpi-scan", version, about = "Scan a document for MNPI with a local LLM")]
struct Cli {
    /// Document to scan: plain text or Markdown (PDF with the `pdf` feature).
    path: PathBuf,

    /// Model name; defaults to the best installed match of llama3.1, llama3, mistral.
    #[arg(long)]
    model: Option<String>,

    /// Ollama endpoint (also settable via OLLAMA_HOST).
    #[arg(long, value_name = "URL")]
    ollama_url: Option<String>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Target chunk size in characters.
    #[arg(long, value_name = "CHARS")]
    chunk_chars: Option<usize>,

    /// Overlap carried between consecutive chunks, in characters.
    #[arg(long, value_name = "CHARS")]
    chunk_overlap: Option<usize>,

    /// Model invocations allowed per chunk before giving up.
    #[arg(long, value_name = "N")]
    max_attempts: Option<usize>,

    /// Delay between retry attempts, in milliseconds.
    #[arg(long, value_name = "MS")]
    retry_delay_ms: Option<u64>,

    /// Print the full report as JSON on stdout.
    #[arg(long)]
    json: bool,

    /// Include per-chunk records in the human-readable output.
    #[arg(long)]
    records: bool,

    /// Debug-level logging for the scanner.
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    std::process::exit(run(cli));
}

/// Logs go to stderr so `--json` output on stdout stays parseable.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "mnpi_scan=debug".to_string()
    } else {
        config::default_log_filter()
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn run(cli: Cli) -> i32 {
    let config = build_config(&cli);
    let client = OllamaClient::new(&config.ollama_url, config.timeout_secs);

    let model = match resolve_model(&client, config.model.as_deref()) {
        Ok(model) => model,
        Err(e) => {
            report_preflight_error(&e);
            return exit_codes::FAILURE;
        }
    };
    tracing::info!(model = %model, endpoint = %config.ollama_url, "preflight passed");

    let scanner = DocumentScanner::new(Box::new(client), &model, &config);
    let report = match scanner.scan_path(&cli.path) {
        Ok(report) => report,
        Err(e) => {
            eprintln!("error: {e}");
            return exit_codes::FAILURE;
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("error: could not encode report: {e}");
                return exit_codes::FAILURE;
            }
        }
    } else {
        print_report(&report, cli.records);
    }

    verdict_exit_code(&report)
}

fn build_config(cli: &Cli) -> ScanConfig {
    let defaults = ScanConfig::default();
    ScanConfig {
        model: cli.model.clone(),
        ollama_url: cli.ollama_url.clone().unwrap_or(defaults.ollama_url),
        timeout_secs: cli.timeout_secs.unwrap_or(defaults.timeout_secs),
        chunk_chars: cli.chunk_chars.unwrap_or(defaults.chunk_chars),
        chunk_overlap: cli.chunk_overlap.unwrap_or(defaults.chunk_overlap),
        max_attempts: cli.max_attempts.unwrap_or(defaults.max_attempts),
        retry_delay: cli
            .retry_delay_ms
            .map(std::time::Duration::from_millis)
            .unwrap_or(defaults.retry_delay),
    }
}

fn report_preflight_error(error: &ClassifyError) {
    eprintln!("error: {error}");
    match error {
        ClassifyError::OllamaConnection(_) => {
            eprintln!("hint: start Ollama with `ollama serve`, or pass --ollama-url");
        }
        ClassifyError::NoModelAvailable => {
            eprintln!("hint: install one with `ollama pull llama3.1`");
        }
        _ => {}
    }
}

fn print_report(report: &ScanReport, with_records: bool) {
    let summary = &report.summary;

    println!("Scan of {}", report.source);
    println!("  model:  {}", report.model);
    println!("  chunks: {}", report.chunk_count);
    println!();

    if with_records {
        for (i, record) in report.records.iter().enumerate() {
            println!(
                "  [{:>3}] {:<7} conf {:.2}  {:<12} {}",
                i + 1,
                record.mnpi.as_str(),
                record.confidence,
                record.recommended_action.as_str(),
                record.evidence_summary
            );
        }
        println!();
    }

    let categories = if summary.categories.is_empty() {
        "(none)".to_string()
    } else {
        summary
            .categories
            .iter()
            .map(|c| c.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    };

    println!("Verdict:     {}", summary.overall_mnpi.as_str());
    println!("Confidence:  {:.2}", summary.overall_confidence);
    println!("Categories:  {categories}");
    println!("Reason:      {}", summary.reason);
    println!("Action:      {}", summary.recommended_action.as_str());
}

fn verdict_exit_code(report: &ScanReport) -> i32 {
    match report.summary.recommended_action {
        RecommendedAction::NoAction => exit_codes::NO_ACTION,
        RecommendedAction::HumanReview => exit_codes::HUMAN_REVIEW,
        RecommendedAction::Escalate => exit_codes::ESCALATE,
    }
}
