use std::future::Future;

use extbuild_common::{BuildOptions, BuildOutput};
use extbuild_error::BuildResult;
use tokio::task::JoinHandle;

/// Runs one build of `options`. The returned future settles once the first build
/// has finished; in watch mode the bundler keeps going in the background and
/// reports later rebuilds to the options' watch handler.
pub trait Builder {
  fn build(&self, options: BuildOptions) -> impl Future<Output = BuildResult<BuildHandle>> + Send;
}

#[derive(Debug)]
pub struct BuildHandle {
  pub output: BuildOutput,
  pub watcher: Option<Watcher>,
}

impl BuildHandle {
  pub fn new(output: BuildOutput) -> Self {
    Self { output, watcher: None }
  }

  #[must_use]
  pub fn with_watcher(mut self, watcher: Watcher) -> Self {
    self.watcher = Some(watcher);
    self
  }
}

/// A bundler that keeps watching after its first build. Dropping the watcher
/// stops the bundler.
#[derive(Debug)]
pub struct Watcher {
  entry: String,
  task: JoinHandle<()>,
}

impl Watcher {
  pub fn new(entry: impl Into<String>, task: JoinHandle<()>) -> Self {
    Self { entry: entry.into(), task }
  }

  pub fn entry(&self) -> &str {
    &self.entry
  }

  /// Resolves when the bundler stops watching.
  pub async fn stopped(mut self) {
    if let Err(err) = (&mut self.task).await {
      tracing::warn!(entry = %self.entry, "watcher task failed: {err}");
    }
  }
}

impl Drop for Watcher {
  fn drop(&mut self) {
    // The task owns the bundler process, which is killed when the task is dropped.
    self.task.abort();
  }
}
