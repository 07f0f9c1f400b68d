//! Structured JSONL run log.
//!
//! Provides:
//! - [`LogEntry`]: one JSON object per event with required + optional fields.
//! - [`LogEmitter`]: writes entries to a file and numbers them with
//!   `linkhash::<run_id>::<seq>` trace ids.
//! - [`validate_log_line`] / [`validate_log_file`]: schema checks for the
//!   emitted lines.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::Path;

/// Prefix of every trace id.
pub const TRACE_PREFIX: &str = "linkhash";

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

/// Severity level for log entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Error,
}

/// Result of the step an entry reports on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
}

/// Canonical structured log entry.
///
/// Required fields: `timestamp`, `trace_id`, `level`, `event`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    // Required
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    // Optional
    /// Input object path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// `ELF32` or `ELF64`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    /// `SYMTAB` or `DYNSYM`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol_section: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbols_scanned: Option<u64>,
    /// Number of API records kept.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub records: Option<u64>,
    /// `digest` or `dump`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    /// Create a new log entry with required fields only.
    ///
    /// Pass an empty `trace_id` to have [`LogEmitter::emit_entry`] assign one.
    #[must_use]
    pub fn new(trace_id: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: trace_id.into(),
            level,
            event: event.into(),
            path: None,
            class: None,
            symbol_section: None,
            symbols_scanned: None,
            records: None,
            mode: None,
            outcome: None,
            exit_code: None,
            duration_ms: None,
            details: None,
        }
    }

    /// Set the input path.
    #[must_use]
    pub fn with_path(mut self, path: &Path) -> Self {
        self.path = Some(path.display().to_string());
        self
    }

    /// Set the ELF class name.
    #[must_use]
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set the symbol table statistics.
    #[must_use]
    pub fn with_symbols(
        mut self,
        section: impl Into<String>,
        scanned: usize,
        records: usize,
    ) -> Self {
        self.symbol_section = Some(section.into());
        self.symbols_scanned = Some(scanned as u64);
        self.records = Some(records as u64);
        self
    }

    /// Set the output mode.
    #[must_use]
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = Some(mode.into());
        self
    }

    /// Set the outcome.
    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Set exit code.
    #[must_use]
    pub fn with_exit_code(mut self, exit_code: i32) -> Self {
        self.exit_code = Some(exit_code);
        self
    }

    /// Set duration in milliseconds.
    #[must_use]
    pub fn with_duration_ms(mut self, ms: u64) -> Self {
        self.duration_ms = Some(ms);
        self
    }

    /// Set free-form details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Serialize to a single JSONL line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Log emitter
// ---------------------------------------------------------------------------

/// Writes structured JSONL log entries.
pub struct LogEmitter {
    writer: Box<dyn Write>,
    seq: u64,
    run_id: String,
}

impl LogEmitter {
    /// Create an emitter that writes to a file, truncating it.
    pub fn to_file(path: &Path, run_id: &str) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self {
            writer: Box::new(std::io::BufWriter::new(file)),
            seq: 0,
            run_id: run_id.to_string(),
        })
    }

    /// Generate the next trace ID.
    fn next_trace_id(&mut self) -> String {
        self.seq += 1;
        format!("{TRACE_PREFIX}::{}::{:03}", self.run_id, self.seq)
    }

    /// Emit a fully-populated log entry, numbering it if `trace_id` is empty.
    pub fn emit_entry(&mut self, mut entry: LogEntry) -> std::io::Result<()> {
        if entry.trace_id.is_empty() {
            entry.trace_id = self.next_trace_id();
        }
        let line = serde_json::to_string(&entry).map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validation error for a log line.
#[derive(Debug)]
pub struct LogValidationError {
    pub line_number: usize,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for LogValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: field '{}': {}",
            self.line_number, self.field, self.message
        )
    }
}

/// Validate a single JSONL line against the schema.
pub fn validate_log_line(
    line: &str,
    line_number: usize,
) -> Result<LogEntry, Vec<LogValidationError>> {
    let mut errors = Vec::new();
    let push = |errors: &mut Vec<LogValidationError>, field: &str, message: String| {
        errors.push(LogValidationError {
            line_number,
            field: field.to_string(),
            message,
        });
    };

    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            push(&mut errors, "<json>", format!("invalid JSON: {e}"));
            return Err(errors);
        }
    };

    let Some(obj) = value.as_object() else {
        push(&mut errors, "<root>", "expected JSON object".to_string());
        return Err(errors);
    };

    for field in ["timestamp", "trace_id", "level", "event"] {
        if !obj.contains_key(field) {
            push(&mut errors, field, "required field missing".to_string());
        }
    }

    if let Some(level) = obj.get("level").and_then(|v| v.as_str())
        && !["info", "error"].contains(&level)
    {
        push(&mut errors, "level", format!("invalid level: '{level}'"));
    }

    if let Some(mode) = obj.get("mode").and_then(|v| v.as_str())
        && !["digest", "dump"].contains(&mode)
    {
        push(&mut errors, "mode", format!("invalid mode: '{mode}'"));
    }

    if let Some(outcome) = obj.get("outcome").and_then(|v| v.as_str())
        && !["pass", "fail"].contains(&outcome)
    {
        push(&mut errors, "outcome", format!("invalid outcome: '{outcome}'"));
    }

    if let Some(class) = obj.get("class").and_then(|v| v.as_str())
        && !["ELF32", "ELF64"].contains(&class)
    {
        push(&mut errors, "class", format!("invalid class: '{class}'"));
    }

    // <prefix>::<run_id>::<seq>
    if let Some(trace_id) = obj.get("trace_id").and_then(|v| v.as_str()) {
        let parts: Vec<&str> = trace_id.split("::").collect();
        let well_formed = parts.len() == 3
            && parts[0] == TRACE_PREFIX
            && !parts[1].is_empty()
            && !parts[2].is_empty()
            && parts[2].bytes().all(|b| b.is_ascii_digit());
        if !well_formed {
            push(
                &mut errors,
                "trace_id",
                format!(
                    "trace_id should follow {TRACE_PREFIX}::<run_id>::<seq> format, got: '{trace_id}'"
                ),
            );
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    match serde_json::from_value::<LogEntry>(value) {
        Ok(entry) => Ok(entry),
        Err(e) => {
            push(&mut errors, "<deserialization>", format!("failed to deserialize: {e}"));
            Err(errors)
        }
    }
}

/// Validate an entire JSONL file.
///
/// Returns the total line count and any validation errors found.
pub fn validate_log_file(path: &Path) -> Result<(usize, Vec<LogValidationError>), std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    let mut all_errors = Vec::new();
    let mut line_count = 0;

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        line_count += 1;
        if let Err(errs) = validate_log_line(line, i + 1) {
            all_errors.extend(errs);
        }
    }

    Ok((line_count, all_errors))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now_utc() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    format_utc(duration.as_secs(), duration.subsec_millis())
}

/// RFC 3339 UTC timestamp with millisecond precision.
fn format_utc(secs: u64, millis: u32) -> String {
    let days = (secs / 86_400) as i64;
    let (year, month, day) = civil_from_days(days);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{millis:03}Z",
        (secs % 86_400) / 3600,
        (secs % 3600) / 60,
        secs % 60,
    )
}

/// Proleptic Gregorian date for a day count relative to 1970-01-01.
fn civil_from_days(days: i64) -> (i64, u32, u32) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z.rem_euclid(146_097);
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + i64::from(month <= 2);
    (year, month, day)
}
