// crates/bhd-assist-cli/src/main.rs
// ============================================================================
// Module: BHD Assist CLI Entry Point
// Description: Command dispatcher for the assistant policy core.
// Purpose: Exercise level resolution, content checks, and playbook selection end-to-end.
// Dependencies: bhd-assist-config, bhd-assist-core, clap, serde_jcs, tracing-subscriber
// ============================================================================

//! ## Overview
//! `bhd-assist` is a thin caller of the policy core. Every command loads the
//! configuration, builds a guidance gate over the configured pattern catalog
//! and selection rules, and appends its decision to the JSONL audit log
//! before printing canonical JSON to stdout. Content that is blocked exits
//! with status 2 so scripts can gate on it.
//!
//! Security posture: inputs are untrusted; file reads are size bounded and
//! diagnostics never echo candidate text.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[cfg(test)]
mod main_tests;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fs;
use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use bhd_assist_config::AssistConfig;
use bhd_assist_core::AssistanceLevel;
use bhd_assist_core::AssistanceRequest;
use bhd_assist_core::GuidanceGate;
use bhd_assist_core::JsonlAuditLog;
use bhd_assist_core::Observation;
use clap::Args;
use clap::Parser;
use clap::Subcommand;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum size of `--input` and `--observations` files.
const MAX_INPUT_BYTES: usize = 1024 * 1024;
/// Exit status when checked content is blocked.
const BLOCKED_EXIT_CODE: u8 = 2;
/// Log filter used when `RUST_LOG` is unset or invalid.
const DEFAULT_LOG_FILTER: &str = "warn";

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "bhd-assist", version, disable_help_subcommand = true)]
struct Cli {
    /// Config file (overrides `BHD_ASSIST_CONFIG`).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Resolve the effective assistance level for a context.
    Level(LevelCommand),
    /// Check candidate guidance against the pattern catalog.
    Check(CheckCommand),
    /// Select a validation playbook from observations.
    Select(SelectCommand),
    /// Record that an external export completed.
    ExportEvent(ExportEventCommand),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for `level`.
#[derive(Args, Debug)]
struct LevelCommand {
    /// Engagement environment (`prod_client`, `lab`, `ctf`).
    #[arg(long)]
    environment: String,
    /// Who owns the target (`self`, `client`, `unknown`).
    #[arg(long, default_value = "unknown")]
    target_owner: String,
    /// Requested guidance depth (`standard`, `deep_lab`).
    #[arg(long, default_value = "standard")]
    requested_level: String,
    /// Caller attests written authorization.
    #[arg(long)]
    authorized: bool,
}

/// Arguments for `check`.
#[derive(Args, Debug)]
struct CheckCommand {
    /// Effective assistance level.
    #[arg(long, value_parser = parse_level)]
    level: AssistanceLevel,
    /// Label recorded in the audit log.
    #[arg(long, default_value = "cli")]
    source: String,
    /// Candidate text.
    #[arg(long, conflicts_with = "input", required_unless_present = "input")]
    text: Option<String>,
    /// File holding candidate text.
    #[arg(long, value_name = "FILE")]
    input: Option<PathBuf>,
    /// Treat the candidate as a JSON document and check every string field.
    #[arg(long)]
    structured: bool,
}

/// Arguments for `select`.
#[derive(Args, Debug)]
struct SelectCommand {
    /// Test type the playbook is for.
    #[arg(long)]
    test_type: String,
    /// JSON array of observations.
    #[arg(long, value_name = "FILE")]
    observations: PathBuf,
    /// Effective assistance level recorded with the decision.
    #[arg(long, value_parser = parse_level, default_value = "validation_only")]
    level: AssistanceLevel,
}

/// Arguments for `export-event`.
#[derive(Args, Debug)]
struct ExportEventCommand {
    /// Assistance level the export ran at.
    #[arg(long, value_parser = parse_level)]
    level: AssistanceLevel,
    /// Export detail as `key=value`; repeatable.
    #[arg(long = "detail", value_parser = parse_detail)]
    details: Vec<(String, String)>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Load config, pattern catalog, and selection rules.
    Validate,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for user-facing messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

/// Errors from bounded file reads.
#[derive(Debug, Error)]
enum ReadLimitError {
    /// The file could not be read.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The file exceeds the limit.
    #[error("file exceeds size limit ({size} > {limit} bytes)")]
    TooLarge {
        /// Observed size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
fn main() -> ExitCode {
    init_tracing();
    match run() {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = AssistConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    match cli.command {
        Commands::Level(command) => command_level(&config, &command),
        Commands::Check(command) => command_check(&config, &command),
        Commands::Select(command) => command_select(&config, &command),
        Commands::ExportEvent(command) => command_export_event(&config, command),
        Commands::Config {
            command: ConfigCommand::Validate,
        } => command_config_validate(&config),
    }
}

/// Installs the stderr `fmt` subscriber filtered by `RUST_LOG`.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

// ============================================================================
// SECTION: Commands
// ============================================================================

/// Executes `level`.
fn command_level(config: &AssistConfig, command: &LevelCommand) -> CliResult<ExitCode> {
    let gate = open_gate(config)?;
    let request = AssistanceRequest {
        environment: command.environment.clone(),
        authorized: command.authorized,
        target_owner: command.target_owner.clone(),
        requested_level: command.requested_level.clone(),
    };
    let resolution = gate
        .resolve_request(&request)
        .map_err(|err| CliError::new(format!("level resolution failed: {err}")))?;
    write_canonical_json(&resolution)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `check`; exits with [`BLOCKED_EXIT_CODE`] when blocked.
fn command_check(config: &AssistConfig, command: &CheckCommand) -> CliResult<ExitCode> {
    let text = match (&command.text, &command.input) {
        (Some(text), _) => text.clone(),
        (None, Some(path)) => read_text_input(path, "input")?,
        (None, None) => return Err(CliError::new("one of --text or --input is required".to_string())),
    };
    let gate = open_gate(config)?;
    let allowed = if command.structured {
        let document: Value = serde_json::from_str(&text)
            .map_err(|err| CliError::new(format!("structured input is not valid json: {err}")))?;
        let verdict = gate
            .check_structured(&document, command.level, &command.source)
            .map_err(|err| CliError::new(format!("content check failed: {err}")))?;
        write_canonical_json(&verdict)?;
        verdict.verdict.allowed
    } else {
        let verdict = gate
            .check_content(&text, command.level, &command.source)
            .map_err(|err| CliError::new(format!("content check failed: {err}")))?;
        write_canonical_json(&verdict)?;
        verdict.allowed
    };
    Ok(if allowed { ExitCode::SUCCESS } else { ExitCode::from(BLOCKED_EXIT_CODE) })
}

/// Executes `select`.
fn command_select(config: &AssistConfig, command: &SelectCommand) -> CliResult<ExitCode> {
    let observations = read_observations(&command.observations)?;
    let gate = open_gate(config)?;
    let result = gate
        .select_playbook(&command.test_type, &observations, command.level)
        .map_err(|err| CliError::new(format!("playbook selection failed: {err}")))?;
    write_canonical_json(&result)?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `export-event`.
fn command_export_event(config: &AssistConfig, command: ExportEventCommand) -> CliResult<ExitCode> {
    let gate = open_gate(config)?;
    let details: BTreeMap<String, String> = command.details.into_iter().collect();
    gate.record_export(command.level, details)
        .map_err(|err| CliError::new(format!("export event failed: {err}")))?;
    write_canonical_json(&json!({ "recorded": "export_completed" }))?;
    Ok(ExitCode::SUCCESS)
}

/// Executes `config validate`.
fn command_config_validate(config: &AssistConfig) -> CliResult<ExitCode> {
    let catalog = config
        .pattern_catalog()
        .map_err(|err| CliError::new(format!("pattern catalog invalid: {err}")))?;
    let rules = config
        .selection_rules()
        .map_err(|err| CliError::new(format!("selection rules invalid: {err}")))?;
    let summary = json!({
        "audit_log": config.audit_log_path().display().to_string(),
        "hash_chain": config.audit.hash_chain,
        "pattern_catalog_version": catalog.version(),
        "patterns": catalog.len(),
        "selection_rules_version": rules.version(),
        "rules": rules.rules().len(),
    });
    write_canonical_json(&summary)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Gate Construction
// ============================================================================

/// Builds a guidance gate writing to the configured audit log.
fn open_gate(config: &AssistConfig) -> CliResult<GuidanceGate<JsonlAuditLog<File>>> {
    let catalog = config
        .pattern_catalog()
        .map_err(|err| CliError::new(format!("pattern catalog invalid: {err}")))?;
    let rules = config
        .selection_rules()
        .map_err(|err| CliError::new(format!("selection rules invalid: {err}")))?;
    let log_path = config.audit_log_path();
    if let Some(parent) = log_path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|err| {
            CliError::new(format!("failed to create audit log directory {}: {err}", parent.display()))
        })?;
    }
    let sink = JsonlAuditLog::<File>::open(&log_path, config.audit_log_options()).map_err(|err| {
        CliError::new(format!("failed to open audit log {}: {err}", log_path.display()))
    })?;
    debug!(path = %log_path.display(), "audit log opened");
    Ok(GuidanceGate::new(Arc::new(catalog), Arc::new(rules), sink).with_redactor(config.redactor()))
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Parses an implemented assistance level.
fn parse_level(value: &str) -> Result<AssistanceLevel, String> {
    value.parse::<AssistanceLevel>().map_err(|err| err.to_string())
}

/// Parses a `key=value` detail.
fn parse_detail(value: &str) -> Result<(String, String), String> {
    let (key, detail) =
        value.split_once('=').ok_or_else(|| format!("detail '{value}' must be key=value"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("detail '{value}' has an empty key"));
    }
    Ok((key.to_string(), detail.to_string()))
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Reads a UTF-8 input file.
fn read_text_input(path: &Path, kind: &str) -> CliResult<String> {
    let bytes = read_bytes_with_limit(path, MAX_INPUT_BYTES).map_err(|err| {
        CliError::new(format!("failed to read {kind} {}: {err}", path.display()))
    })?;
    String::from_utf8(bytes)
        .map_err(|_| CliError::new(format!("{kind} {} must be utf-8", path.display())))
}

/// Reads and validates an observation array.
fn read_observations(path: &Path) -> CliResult<Vec<Observation>> {
    let text = read_text_input(path, "observations")?;
    let observations: Vec<Observation> = serde_json::from_str(&text)
        .map_err(|err| CliError::new(format!("observations are not valid: {err}")))?;
    for observation in &observations {
        observation
            .validate()
            .map_err(|err| CliError::new(format!("observations are not valid: {err}")))?;
    }
    Ok(observations)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes canonical JSON plus a newline to stdout.
fn write_canonical_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut bytes = serde_jcs::to_vec(value)
        .map_err(|err| CliError::new(format!("failed to render json: {err}")))?;
    bytes.push(b'\n');
    let mut stdout = std::io::stdout();
    stdout.write_all(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
