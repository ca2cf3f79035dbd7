use std::{fmt::Debug, sync::Arc};

use extbuild_error::BuildError;

use crate::BuildOutput;

type RebuildCallback = dyn Fn(Option<&BuildError>, Option<&BuildOutput>) + Send + Sync;

/// Called by the bundler after every rebuild in watch mode, with either the
/// rebuild's error or its output.
#[derive(Clone)]
pub struct WatchHandler {
  entry: String,
  on_rebuild: Arc<RebuildCallback>,
}

impl WatchHandler {
  pub fn new(
    entry: impl Into<String>,
    on_rebuild: impl Fn(Option<&BuildError>, Option<&BuildOutput>) + Send + Sync + 'static,
  ) -> Self {
    Self { entry: entry.into(), on_rebuild: Arc::new(on_rebuild) }
  }

  pub fn entry(&self) -> &str {
    &self.entry
  }

  pub fn on_rebuild(&self, error: Option<&BuildError>, output: Option<&BuildOutput>) {
    (self.on_rebuild)(error, output);
  }
}

impl Debug for WatchHandler {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("WatchHandler").field("entry", &self.entry).finish_non_exhaustive()
  }
}

/// `Disabled` is the explicit `watch: false` of a build config, not an absent option.
#[derive(Debug, Clone, Default)]
pub enum WatchOption {
  #[default]
  Disabled,
  Enabled(WatchHandler),
}

impl WatchOption {
  pub fn is_enabled(&self) -> bool {
    matches!(self, Self::Enabled(_))
  }

  pub fn handler(&self) -> Option<&WatchHandler> {
    match self {
      Self::Disabled => None,
      Self::Enabled(handler) => Some(handler),
    }
  }
}

impl std::fmt::Display for WatchOption {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Disabled => write!(f, "false"),
      Self::Enabled(handler) => write!(f, "onRebuild({})", handler.entry),
    }
  }
}

#[test]
fn test_disabled_watch_renders_as_false() {
  assert_eq!(WatchOption::default().to_string(), "false");
  assert!(WatchOption::Disabled.handler().is_none());
}

#[test]
fn test_handler_forwards_arguments() {
  use std::sync::atomic::{AtomicUsize, Ordering};

  let failures = Arc::new(AtomicUsize::new(0));
  let counter = Arc::clone(&failures);
  let handler = WatchHandler::new("./src/client.ts", move |error, _| {
    if error.is_some() {
      counter.fetch_add(1, Ordering::SeqCst);
    }
  });

  let error = BuildError::from(extbuild_error::BuildDiagnostic::new("bad"));
  handler.on_rebuild(Some(&error), None);
  handler.on_rebuild(None, Some(&BuildOutput::default()));
  assert_eq!(failures.load(Ordering::SeqCst), 1);
  assert_eq!(WatchOption::Enabled(handler).to_string(), "onRebuild(./src/client.ts)");
}
