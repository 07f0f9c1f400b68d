//! One fingerprinting run.
//!
//! Output is rendered completely in memory and the input mapping is released
//! before the sink is touched, so a failing input never leaves partial output.

use std::time::Instant;

use linkhash_core::{ExtractedApi, MappedFile, OutputMode};

use crate::CliError;
use crate::config::Config;
use crate::output::{WriteOutcome, write_output};
use crate::structured_log::{LogEmitter, LogEntry, LogLevel, Outcome};

/// Summary of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub mode: OutputMode,
    /// API records in the output.
    pub records: usize,
    /// Bytes rendered for the sink.
    pub bytes: usize,
    pub outcome: WriteOutcome,
}

/// Run the configuration end to end.
///
/// When `config.log_file` is set, each step is recorded there as JSONL; a
/// failure is logged as `run.error` before being returned.
pub fn execute(config: &Config) -> Result<RunReport, CliError> {
    let mut log = RunLog::open(config)?;
    let started = Instant::now();

    log.emit(|| {
        LogEntry::new("", LogLevel::Info, "run.start")
            .with_path(&config.input)
            .with_mode(config.mode.name())
            .with_details(serde_json::json!({
                "output": config.output.describe(),
                "only_if_changed": config.only_if_changed,
            }))
    })?;

    match fingerprint(config, &mut log) {
        Ok(report) => {
            log.emit(|| {
                LogEntry::new("", LogLevel::Info, report.outcome.event())
                    .with_path(&config.input)
                    .with_mode(report.mode.name())
                    .with_outcome(Outcome::Pass)
                    .with_exit_code(0)
                    .with_duration_ms(elapsed_ms(started))
                    .with_details(serde_json::json!({
                        "output": config.output.describe(),
                        "bytes": report.bytes,
                    }))
            })?;
            log.flush()?;
            Ok(report)
        }
        Err(err) => {
            // The run error is what gets reported; a log failure here would mask it.
            let _ = log
                .emit(|| {
                    LogEntry::new("", LogLevel::Error, "run.error")
                        .with_path(&config.input)
                        .with_mode(config.mode.name())
                        .with_outcome(Outcome::Fail)
                        .with_exit_code(i32::from(err.exit_code()))
                        .with_duration_ms(elapsed_ms(started))
                        .with_details(serde_json::json!({ "error": err.to_string() }))
                })
                .and_then(|()| log.flush());
            Err(err)
        }
    }
}

fn fingerprint(config: &Config, log: &mut RunLog) -> Result<RunReport, CliError> {
    let (rendered, records) = {
        let mapped = MappedFile::open(&config.input)?;
        let api = mapped.extract_api()?;
        log.emit(|| extracted_entry(config, &api))?;
        let records = api.records.len();
        (api.into_fingerprint().render(config.mode), records)
    };

    let outcome = write_output(&config.output, &rendered, config.only_if_changed)?;
    Ok(RunReport {
        mode: config.mode,
        records,
        bytes: rendered.len(),
        outcome,
    })
}

fn extracted_entry(config: &Config, api: &ExtractedApi<'_>) -> LogEntry {
    LogEntry::new("", LogLevel::Info, "api.extracted")
        .with_path(&config.input)
        .with_class(api.class.name())
        .with_symbols(
            api.symbol_section.name(),
            api.symbols_scanned,
            api.records.len(),
        )
        .with_details(serde_json::json!({ "machine": u16::from(api.machine) }))
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Structured log that is a no-op without `--log-file`.
struct RunLog {
    emitter: Option<LogEmitter>,
}

impl RunLog {
    fn open(config: &Config) -> Result<Self, CliError> {
        let emitter = match &config.log_file {
            Some(path) => Some(LogEmitter::to_file(path, &run_id()).map_err(|source| {
                CliError::LogOpen {
                    path: path.clone(),
                    source,
                }
            })?),
            None => None,
        };
        Ok(Self { emitter })
    }

    /// Entries are only built when logging is enabled.
    fn emit(&mut self, entry: impl FnOnce() -> LogEntry) -> Result<(), CliError> {
        match &mut self.emitter {
            Some(emitter) => emitter.emit_entry(entry()).map_err(CliError::LogWrite),
            None => Ok(()),
        }
    }

    fn flush(&mut self) -> Result<(), CliError> {
        match &mut self.emitter {
            Some(emitter) => emitter.flush().map_err(CliError::LogWrite),
            None => Ok(()),
        }
    }
}

fn run_id() -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();
    format!("{}-{millis}", std::process::id())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputTarget;
    use crate::structured_log::validate_log_file;
    use linkhash_core::elf::{ElfClass, ElfType, SymbolBinding};
    use linkhash_core::fixture::SharedObjectBuilder;
    use std::path::{Path, PathBuf};

    fn config(input: &Path, output: OutputTarget, mode: OutputMode) -> Config {
        Config {
            input: input.to_path_buf(),
            output,
            mode,
            only_if_changed: false,
            log_file: None,
        }
    }

    fn write_object(dir: &Path, builder: &SharedObjectBuilder) -> PathBuf {
        let path = dir.join("libfoo.so");
        std::fs::write(&path, builder.build()).unwrap();
        path
    }

    fn sample() -> SharedObjectBuilder {
        SharedObjectBuilder::new(ElfClass::Elf64)
            .symbol("foo", SymbolBinding::Global)
            .symbol("bar", SymbolBinding::Weak)
            .symbol("local", SymbolBinding::Local)
    }

    #[test]
    fn dump_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_object(dir.path(), &sample());
        let out = dir.path().join("api.txt");

        let report = execute(&config(
            &input,
            OutputTarget::File(out.clone()),
            OutputMode::Dump,
        ))
        .unwrap();

        assert_eq!(report.records, 2);
        assert_eq!(report.outcome, WriteOutcome::Written);
        assert_eq!(
            std::fs::read_to_string(&out).unwrap(),
            "GLOBAL,foo\nWEAK,bar\n"
        );
        assert_eq!(report.bytes, "GLOBAL,foo\nWEAK,bar\n".len());
    }

    #[test]
    fn failure_leaves_existing_output_alone() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_object(dir.path(), &sample().object_type(ElfType::Exec));
        let out = dir.path().join("libfoo.apid");
        std::fs::write(&out, b"previous\n").unwrap();

        let err = execute(&config(
            &input,
            OutputTarget::File(out.clone()),
            OutputMode::Digest,
        ))
        .unwrap_err();

        assert!(matches!(err, CliError::Fingerprint(_)));
        assert!(err.to_string().ends_with("not a shared object (3), e_type=2"));
        assert_eq!(std::fs::read(&out).unwrap(), b"previous\n");
    }

    #[test]
    fn logs_success_events() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_object(dir.path(), &sample());
        let log_path = dir.path().join("run.jsonl");
        let mut cfg = config(
            &input,
            OutputTarget::File(dir.path().join("libfoo.apid")),
            OutputMode::Digest,
        );
        cfg.log_file = Some(log_path.clone());

        execute(&cfg).unwrap();

        let (count, errors) = validate_log_file(&log_path).unwrap();
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(count, 3);
        let events: Vec<serde_json::Value> = std::fs::read_to_string(&log_path)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(events[0]["event"], "run.start");
        assert_eq!(events[1]["event"], "api.extracted");
        assert_eq!(events[1]["class"], "ELF64");
        assert_eq!(events[1]["symbol_section"], "DYNSYM");
        assert_eq!(events[1]["symbols_scanned"], 4);
        assert_eq!(events[1]["records"], 2);
        assert_eq!(events[2]["event"], "output.written");
        assert_eq!(events[2]["outcome"], "pass");
        assert_eq!(events[2]["details"]["bytes"], 41);
    }

    #[test]
    fn logs_failure_event() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("notes.txt");
        std::fs::write(&input, b"plain text\n").unwrap();
        let log_path = dir.path().join("run.jsonl");
        let mut cfg = config(&input, OutputTarget::Stdout, OutputMode::Digest);
        cfg.log_file = Some(log_path.clone());

        assert!(execute(&cfg).is_err());

        let content = std::fs::read_to_string(&log_path).unwrap();
        let last: serde_json::Value =
            serde_json::from_str(content.lines().last().unwrap()).unwrap();
        assert_eq!(last["event"], "run.error");
        assert_eq!(last["level"], "error");
        assert_eq!(last["exit_code"], 1);
        assert!(
            last["details"]["error"]
                .as_str()
                .unwrap()
                .ends_with("wrong ELF magic")
        );
    }

    #[test]
    fn unopenable_log_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_object(dir.path(), &sample());
        let mut cfg = config(&input, OutputTarget::Stdout, OutputMode::Digest);
        cfg.log_file = Some(dir.path().join("missing-dir").join("run.jsonl"));
        assert!(matches!(execute(&cfg), Err(CliError::LogOpen { .. })));
    }
}
