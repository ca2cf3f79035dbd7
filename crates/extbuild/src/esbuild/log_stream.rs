use std::process::ExitStatus;

use extbuild_common::BuildWarning;
use extbuild_error::{BuildDiagnostic, BuildError, BuildResult};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader, Lines};

use super::log_parser::{LogEvent, LogParser, Severity};

/// Diagnostics reported during one build.
#[derive(Debug, Default)]
pub struct BuildCycle {
  errors: Vec<BuildDiagnostic>,
  warnings: Vec<BuildWarning>,
  /// The count from esbuild's closing `N errors` line.
  reported_errors: usize,
}

impl BuildCycle {
  fn record(&mut self, severity: Severity, diagnostic: BuildDiagnostic) {
    match severity {
      Severity::Error => self.errors.push(diagnostic),
      Severity::Warning => self.warnings.push(diagnostic),
    }
  }

  /// The build failed if esbuild reported any error, even one whose message
  /// could not be parsed.
  pub fn into_result(self) -> BuildResult<Vec<BuildWarning>> {
    if !self.errors.is_empty() {
      return Err(BuildError(self.errors));
    }
    match self.reported_errors {
      0 => Ok(self.warnings),
      count => Err(unreadable_errors(count).into()),
    }
  }

  /// The error of a build whose process exited with `status`.
  pub fn into_error(self, status: ExitStatus) -> BuildError {
    if !self.errors.is_empty() {
      return BuildError(self.errors);
    }
    match self.reported_errors {
      0 => BuildDiagnostic::new(format!("esbuild exited with {status}")).into(),
      count => unreadable_errors(count).into(),
    }
  }
}

fn unreadable_errors(count: usize) -> BuildDiagnostic {
  let noun = if count == 1 { "error" } else { "errors" };
  BuildDiagnostic::new(format!("esbuild reported {count} {noun} that could not be read from its log"))
}

/// esbuild's stderr, read as a sequence of build cycles.
pub struct LogStream<R> {
  lines: Lines<BufReader<R>>,
  parser: LogParser,
  current: BuildCycle,
}

impl<R: AsyncRead + Unpin> LogStream<R> {
  pub fn new(reader: R) -> Self {
    Self { lines: BufReader::new(reader).lines(), parser: LogParser::default(), current: BuildCycle::default() }
  }

  /// Reads until esbuild reports the end of a build. Returns `None` once the
  /// output ends; whatever was reported after the last finished build is then
  /// left in [`LogStream::into_remaining`].
  pub async fn next_cycle(&mut self) -> anyhow::Result<Option<BuildCycle>> {
    while let Some(line) = self.lines.next_line().await? {
      tracing::trace!(target: "esbuild", "{line}");
      for event in self.parser.push_line(&line) {
        match event {
          LogEvent::Message { severity, diagnostic } => self.current.record(severity, diagnostic),
          LogEvent::ErrorSummary { count } => {
            self.current.reported_errors = self.current.reported_errors.max(count);
          }
          LogEvent::BuildStarted => {}
          // Always the last event of a line.
          LogEvent::BuildFinished => return Ok(Some(std::mem::take(&mut self.current))),
        }
      }
    }

    if let Some(LogEvent::Message { severity, diagnostic }) = self.parser.finish() {
      self.current.record(severity, diagnostic);
    }
    Ok(None)
  }

  pub fn into_remaining(self) -> BuildCycle {
    self.current
  }
}

#[tokio::test]
async fn test_one_shot_output_has_no_cycles() {
  let log = "✘ [ERROR] Could not resolve \"vscode-languageclient\"\n\n    src/client.ts:1:24:\n\n1 error\n";
  let mut stream = LogStream::new(log.as_bytes());
  assert!(stream.next_cycle().await.unwrap().is_none());

  let error = stream.into_remaining().into_result().unwrap_err();
  assert_eq!(error.len(), 1);
  assert_eq!(error[0].location.as_ref().map(|location| location.column), Some(24));
}

#[tokio::test]
async fn test_watch_output_splits_into_cycles() {
  let log = "\
▲ [WARNING] Duplicate key \"id\" in object literal

    src/client.ts:4:2:

[watch] build finished, watching for changes...
[watch] build started (change: \"src/client.ts\")
✘ [ERROR] Unexpected end of file

    src/client.ts:20:0:

1 error
[watch] build finished
[watch] build started (change: \"src/client.ts\")
[watch] build finished
";
  let mut stream = LogStream::new(log.as_bytes());

  let initial = stream.next_cycle().await.unwrap().unwrap().into_result().unwrap();
  assert_eq!(initial.len(), 1);

  let failed = stream.next_cycle().await.unwrap().unwrap().into_result().unwrap_err();
  assert_eq!(failed[0].text, "Unexpected end of file");

  let fixed = stream.next_cycle().await.unwrap().unwrap().into_result().unwrap();
  assert!(fixed.is_empty());

  assert!(stream.next_cycle().await.unwrap().is_none());
}

#[cfg(unix)]
#[test]
fn test_exit_status_stands_in_for_missing_errors() {
  use std::os::unix::process::ExitStatusExt;

  let error = BuildCycle::default().into_error(ExitStatus::from_raw(1 << 8));
  assert_eq!(error.len(), 1);
  assert_eq!(error[0].text, "esbuild exited with exit status: 1");
}

#[tokio::test]
async fn test_unparsed_errors_still_fail_the_cycle() {
  let log = "\
[watch] build finished, watching for changes...
[watch] build started (change: \"src/client.ts\")
error: something esbuild printed in a layout this parser does not know

1 error
[watch] build finished
";
  let mut stream = LogStream::new(log.as_bytes());
  assert!(stream.next_cycle().await.unwrap().unwrap().into_result().is_ok());

  let failed = stream.next_cycle().await.unwrap().unwrap().into_result().unwrap_err();
  assert_eq!(failed.len(), 1);
  assert_eq!(failed[0].text, "esbuild reported 1 error that could not be read from its log");
  assert!(failed[0].location.is_none());
}

#[test]
fn test_summary_count_does_not_duplicate_parsed_errors() {
  let mut cycle = BuildCycle::default();
  cycle.record(Severity::Error, BuildDiagnostic::new("Unexpected \"}\""));
  cycle.reported_errors = 1;
  let error = cycle.into_result().unwrap_err();
  assert_eq!(error.len(), 1);
  assert_eq!(error[0].text, "Unexpected \"}\"");
}
