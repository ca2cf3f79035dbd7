use std::sync::LazyLock;

use extbuild_error::{BuildDiagnostic, Location};
use regex::Regex;

// `✘ [ERROR] Could not resolve "./missing" [plugin css]`, `X` replaces `✘` on Windows.
static MESSAGE_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?:✘|X|▲) \[(?P<kind>ERROR|WARNING)\] (?P<text>.*?)(?: \[plugin [^\]]+\])?$").unwrap()
});

// `    src/client.ts:3:21:`
static LOCATION_RE: LazyLock<Regex> =
  LazyLock::new(|| Regex::new(r"^\s+(?P<file>.+?):(?P<line>\d+):(?P<column>\d+):$").unwrap());

// `> src/client.ts:3:21: error: Could not resolve "./missing"`, the single-line form of older esbuild releases.
static LEGACY_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(
    r"^> (?P<file>.+?):(?P<line>\d+):(?P<column>\d+): (?P<kind>error|warning): (?P<text>.*)$",
  )
  .unwrap()
});

// `1 error`, `1 warning and 2 errors`, `10 of 14 errors shown (disable the message limit with --log-limit=0)`
static SUMMARY_RE: LazyLock<Regex> = LazyLock::new(|| {
  Regex::new(r"^(?:\d+ (?:of \d+ )?warnings? and )?(?:\d+ of )?(?P<errors>\d+) errors?(?: shown.*)?$").unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
  Error,
  Warning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogEvent {
  Message { severity: Severity, diagnostic: BuildDiagnostic },
  /// The `N errors` line closing the log of a failed build.
  ErrorSummary { count: usize },
  /// `[watch] build started (change: "src/client.ts")`
  BuildStarted,
  /// `[watch] build finished`, also printed after the initial build of a watch session.
  BuildFinished,
}

/// Turns esbuild's uncoloured terminal log back into structured events.
///
/// A message header may be followed by a blank line and its location; the
/// message is held back until it is known whether one follows. Code excerpts
/// and notes produce no events.
#[derive(Debug, Default)]
pub struct LogParser {
  pending: Option<(Severity, BuildDiagnostic)>,
}

impl LogParser {
  pub fn push_line(&mut self, line: &str) -> Vec<LogEvent> {
    let line = line.trim_end_matches('\r');
    let mut events = Vec::new();

    if line.trim().is_empty() {
      return events;
    }

    if self.pending.is_some() {
      if let Some(location) = parse_location(line) {
        if let Some((severity, diagnostic)) = self.pending.take() {
          events.push(LogEvent::Message { severity, diagnostic: diagnostic.with_location(location) });
        }
        return events;
      }
      events.extend(self.finish());
    }

    if let Some(captures) = MESSAGE_RE.captures(line) {
      let severity = severity_of(&captures["kind"]);
      self.pending = Some((severity, BuildDiagnostic::new(&captures["text"])));
    } else if let Some(captures) = LEGACY_RE.captures(line) {
      if let Some(location) = location_from(&captures) {
        events.push(LogEvent::Message {
          severity: severity_of(&captures["kind"]),
          diagnostic: BuildDiagnostic::new(&captures["text"]).with_location(location),
        });
      }
    } else if let Some(count) =
      SUMMARY_RE.captures(line).and_then(|captures| captures["errors"].parse().ok())
    {
      events.push(LogEvent::ErrorSummary { count });
    } else if line.starts_with("[watch] build started") {
      events.push(LogEvent::BuildStarted);
    } else if line.starts_with("[watch] build finished") {
      events.push(LogEvent::BuildFinished);
    }

    events
  }

  /// Flushes a message still waiting for its location.
  pub fn finish(&mut self) -> Option<LogEvent> {
    self.pending.take().map(|(severity, diagnostic)| LogEvent::Message { severity, diagnostic })
  }
}

fn severity_of(kind: &str) -> Severity {
  if kind.eq_ignore_ascii_case("error") { Severity::Error } else { Severity::Warning }
}

fn parse_location(line: &str) -> Option<Location> {
  LOCATION_RE.captures(line).as_ref().and_then(location_from)
}

fn location_from(captures: &regex::Captures<'_>) -> Option<Location> {
  Some(Location {
    file: captures["file"].to_string(),
    line: captures["line"].parse().ok()?,
    column: captures["column"].parse().ok()?,
  })
}

#[cfg(test)]
fn parse(log: &str) -> Vec<LogEvent> {
  let mut parser = LogParser::default();
  let mut events: Vec<_> = log.lines().flat_map(|line| parser.push_line(line)).collect();
  events.extend(parser.finish());
  events
}

#[cfg(test)]
fn located(text: &str, file: &str, line: u32, column: u32) -> BuildDiagnostic {
  BuildDiagnostic::new(text).with_location(Location { file: file.to_string(), line, column })
}

#[test]
fn test_error_with_location_and_excerpt() {
  let log = "\
✘ [ERROR] Could not resolve \"./missing\"

    src/client.ts:3:21:
      3 │ import { foo } from \"./missing\";
        ╵                     ~~~~~~~~~~~

1 error
";
  assert_eq!(
    parse(log),
    vec![
      LogEvent::Message {
        severity: Severity::Error,
        diagnostic: located("Could not resolve \"./missing\"", "src/client.ts", 3, 21),
      },
      LogEvent::ErrorSummary { count: 1 },
    ]
  );
}

#[test]
fn test_warning_and_plugin_suffix() {
  let log = "\
▲ [WARNING] Comparison with -0 using the \"===\" operator will also match 0

    views/info/index.tsx:10:7:
     10 │ if (x === -0) {}
        ╵       ~~~

X [ERROR] Unexpected token [plugin svelte]

    views/info/App.svelte:1:0:
";
  let events = parse(log);
  assert_eq!(events.len(), 2);
  assert!(matches!(&events[0], LogEvent::Message { severity: Severity::Warning, .. }));
  assert_eq!(
    events[1],
    LogEvent::Message {
      severity: Severity::Error,
      diagnostic: located("Unexpected token", "views/info/App.svelte", 1, 0),
    }
  );
}

#[test]
fn test_message_without_location_is_flushed_by_next_line() {
  let log = "\
✘ [ERROR] Could not read from file: /project/src/gone.ts

  The file was removed during the build.

1 error
";
  assert_eq!(
    parse(log),
    vec![
      LogEvent::Message {
        severity: Severity::Error,
        diagnostic: BuildDiagnostic::new("Could not read from file: /project/src/gone.ts"),
      },
      LogEvent::ErrorSummary { count: 1 },
    ]
  );
}

#[test]
fn test_watch_cycle_markers() {
  let log = "\
[watch] build finished, watching for changes...
[watch] build started (change: \"src/client.ts\")
✘ [ERROR] Expected \";\" but found \"}\"

    src/client.ts:12:4:
      12 │     }
         ╵     ^

1 error
[watch] build finished
";
  let events = parse(log);
  assert_eq!(events.first(), Some(&LogEvent::BuildFinished));
  assert_eq!(events.get(1), Some(&LogEvent::BuildStarted));
  assert!(matches!(
    events.get(2),
    Some(LogEvent::Message { severity: Severity::Error, diagnostic })
      if diagnostic.location.as_ref().is_some_and(|location| location.line == 12)
  ));
  assert_eq!(events.get(3), Some(&LogEvent::ErrorSummary { count: 1 }));
  assert_eq!(events.last(), Some(&LogEvent::BuildFinished));
  assert_eq!(events.len(), 5);
}

#[test]
fn test_legacy_single_line_format() {
  let events = parse("> src/client.ts:1:2: error: bad\r\n");
  assert_eq!(
    events,
    vec![LogEvent::Message { severity: Severity::Error, diagnostic: located("bad", "src/client.ts", 1, 2) }]
  );
}

#[test]
fn test_marker_right_after_header_flushes_it_first() {
  let events = parse("✘ [ERROR] Build failed\n[watch] build finished\n");
  assert_eq!(
    events,
    vec![
      LogEvent::Message { severity: Severity::Error, diagnostic: BuildDiagnostic::new("Build failed") },
      LogEvent::BuildFinished,
    ]
  );
}

#[test]
fn test_summary_lines_carry_the_error_count() {
  let events = parse(
    "1 warning and 2 errors\n10 of 14 errors shown (disable the message limit with --log-limit=0)\n3 warnings\n",
  );
  assert_eq!(events, vec![LogEvent::ErrorSummary { count: 2 }, LogEvent::ErrorSummary { count: 14 }]);
}
