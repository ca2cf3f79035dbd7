use extbuild_common::{WatchHandler, WatchOption};
use extbuild_error::BuildError;

use crate::{BuildFlags, Reporter};

/// The watch option for the build of `entry`: a rebuild handler when watching,
/// the `false` sentinel otherwise.
pub fn watch_config(flags: BuildFlags, entry: &str, reporter: &Reporter) -> WatchOption {
  if !flags.watch {
    return WatchOption::Disabled;
  }

  let reporter = reporter.clone();
  let label = entry.to_string();
  WatchOption::Enabled(WatchHandler::new(entry, move |error, _output| {
    reporter.info(format_args!("[watch] build started (rebuild for {label})"));
    match error {
      Some(error) => report_errors(&reporter, error),
      None => reporter.info(format_args!("[watch] build finished (rebuild for {label})")),
    }
  }))
}

/// Prints one `> file:line:column: error: text` line per diagnostic.
pub fn report_errors(reporter: &Reporter, error: &BuildError) {
  for diagnostic in error.errors() {
    reporter.error(format_args!("> {diagnostic}"));
  }
}

#[test]
fn test_disabled_watch_is_false() {
  let (reporter, _, _) = crate::reporter::memory_reporter();
  let option = watch_config(BuildFlags::default(), "./src/client.ts", &reporter);
  assert!(!option.is_enabled());
  assert_eq!(option.to_string(), "false");
}

#[test]
fn test_rebuild_error_prints_located_line() {
  use extbuild_error::{BuildDiagnostic, Location};

  let (reporter, out, err) = crate::reporter::memory_reporter();
  let flags = BuildFlags { watch: true, ..BuildFlags::default() };
  let option = watch_config(flags, "./src/client.ts", &reporter);
  let handler = option.handler().expect("watch handler");

  let error = BuildError::from(BuildDiagnostic::new("bad").with_location(Location {
    file: "a.ts".to_string(),
    line: 1,
    column: 2,
  }));
  handler.on_rebuild(Some(&error), None);

  assert_eq!(out.lines(), vec!["[watch] build started (rebuild for ./src/client.ts)"]);
  let errors = err.lines();
  assert_eq!(errors.len(), 1);
  assert!(errors[0].contains("a.ts:1:2: error: bad"));
}

#[test]
fn test_successful_rebuild_prints_started_then_finished() {
  let (reporter, out, err) = crate::reporter::memory_reporter();
  let flags = BuildFlags { watch: true, ..BuildFlags::default() };
  let option = watch_config(flags, "./views/info/index.tsx", &reporter);
  option
    .handler()
    .expect("watch handler")
    .on_rebuild(None, Some(&extbuild_common::BuildOutput::default()));

  assert_eq!(
    out.lines(),
    vec![
      "[watch] build started (rebuild for ./views/info/index.tsx)",
      "[watch] build finished (rebuild for ./views/info/index.tsx)",
    ]
  );
  assert!(err.lines().is_empty());
}

#[test]
fn test_unlocated_error_is_still_reported() {
  let (reporter, _, err) = crate::reporter::memory_reporter();
  let error = BuildError::from(extbuild_error::BuildDiagnostic::new("Could not read from file"));
  report_errors(&reporter, &error);
  assert_eq!(err.lines(), vec!["> error: Could not read from file"]);
}
