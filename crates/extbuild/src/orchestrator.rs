use extbuild_common::BuildOptions;
use extbuild_error::BuildResult;
use futures::future::{join_all, try_join_all};

use crate::{build_targets, BuildFlags, BuildHandle, Builder, ProjectLayout, Reporter};

/// Builds every target of `layout` concurrently and waits for all of them.
pub async fn run<B: Builder>(
  builder: &B,
  flags: BuildFlags,
  layout: &ProjectLayout,
  reporter: &Reporter,
) -> BuildResult<Vec<BuildHandle>> {
  run_builds(builder, build_targets(flags, layout, reporter), reporter).await
}

/// Submits all `targets` at once. Each success is reported as soon as it
/// settles; the first failure cancels the builds still running.
pub async fn run_builds<B: Builder>(
  builder: &B,
  targets: Vec<BuildOptions>,
  reporter: &Reporter,
) -> BuildResult<Vec<BuildHandle>> {
  let builds = targets.into_iter().map(|options| {
    let entry = options.entry_label().to_string();
    async move {
      match builder.build(options).await {
        Ok(handle) => {
          reporter.info(format_args!("[watch] build finished for {entry}"));
          Ok(handle)
        }
        Err(error) => {
          tracing::debug!(%entry, "build failed: {error}");
          Err(error)
        }
      }
    }
  });

  try_join_all(builds).await
}

/// Resolves once every watching bundler has stopped. Returns immediately when
/// nothing is watched.
pub async fn wait_for_watchers(handles: Vec<BuildHandle>) {
  let watchers: Vec<_> = handles.into_iter().filter_map(|handle| handle.watcher).collect();
  if watchers.is_empty() {
    return;
  }
  tracing::debug!("watching {} builds", watchers.len());
  join_all(watchers.into_iter().map(crate::Watcher::stopped)).await;
}

/// Records the options it receives and fails the entries listed in `failing`.
#[cfg(test)]
#[derive(Default)]
struct FakeBuilder {
  failing: Vec<&'static str>,
  delay_ms: u64,
  watch: bool,
  submitted: std::sync::Mutex<Vec<BuildOptions>>,
}

#[cfg(test)]
impl Builder for FakeBuilder {
  async fn build(&self, options: BuildOptions) -> BuildResult<BuildHandle> {
    use extbuild_common::BuildOutput;
    use extbuild_error::{BuildDiagnostic, BuildError, Location};

    let entry = options.entry_label().to_string();
    self.submitted.lock().unwrap().push(options.clone());
    if self.delay_ms > 0 && entry.contains("views") {
      tokio::time::sleep(std::time::Duration::from_millis(self.delay_ms)).await;
    }

    if self.failing.iter().any(|failing| *failing == entry) {
      return Err(BuildError::from(BuildDiagnostic::new("bad").with_location(Location {
        file: "a.ts".to_string(),
        line: 1,
        column: 2,
      })));
    }

    let handle = BuildHandle::new(BuildOutput::default());
    if self.watch {
      let handler = options.watch.handler().cloned();
      let task = tokio::spawn(async move {
        if let Some(handler) = handler {
          handler.on_rebuild(None, Some(&BuildOutput::default()));
        }
      });
      return Ok(handle.with_watcher(crate::Watcher::new(entry, task)));
    }
    Ok(handle)
  }
}

/// The extension host starts watching forever, the webview build fails a little later.
#[cfg(test)]
struct HostWatchesWebviewFails {
  host_alive: std::sync::Mutex<Option<tokio::sync::oneshot::Sender<()>>>,
}

#[cfg(test)]
impl Builder for HostWatchesWebviewFails {
  async fn build(&self, options: BuildOptions) -> BuildResult<BuildHandle> {
    use extbuild_common::BuildOutput;
    use extbuild_error::{BuildDiagnostic, BuildError};

    if options.entry_label().contains("views") {
      tokio::time::sleep(std::time::Duration::from_millis(20)).await;
      return Err(BuildError::from(BuildDiagnostic::new("Unexpected end of file")));
    }

    let alive = self.host_alive.lock().unwrap().take();
    let task = tokio::spawn(async move {
      let _alive = alive;
      std::future::pending::<()>().await;
    });
    Ok(BuildHandle::new(BuildOutput::default()).with_watcher(crate::Watcher::new(options.entry_label(), task)))
  }
}

#[tokio::test]
async fn test_both_targets_complete_before_returning() {
  let builder = FakeBuilder { delay_ms: 20, ..FakeBuilder::default() };
  let (reporter, out, _) = crate::reporter::memory_reporter();

  let handles = run(&builder, BuildFlags::default(), &ProjectLayout::default(), &reporter).await.unwrap();

  assert_eq!(handles.len(), 2);
  // The delayed webview build settles last even though it was submitted second.
  assert_eq!(
    out.lines(),
    vec!["[watch] build finished for ./src/client.ts", "[watch] build finished for ./views/info/index.tsx"]
  );
  assert_eq!(builder.submitted.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_any_failure_fails_the_run() {
  let builder = FakeBuilder { failing: vec!["./views/info/index.tsx"], ..FakeBuilder::default() };
  let (reporter, out, err) = crate::reporter::memory_reporter();

  let error = run(&builder, BuildFlags::default(), &ProjectLayout::default(), &reporter).await.unwrap_err();

  assert_eq!(error.len(), 1);
  assert!(!out.lines().iter().any(|line| line.contains("./views/info/index.tsx")));
  // Reporting the failure is left to the caller.
  assert!(err.lines().is_empty());
}

#[tokio::test]
async fn test_failed_run_stops_other_watchers() {
  let (alive, stopped) = tokio::sync::oneshot::channel();
  let builder = HostWatchesWebviewFails { host_alive: std::sync::Mutex::new(Some(alive)) };
  let (reporter, out, _) = crate::reporter::memory_reporter();
  let flags = BuildFlags { watch: true, ..BuildFlags::default() };

  let result = run(&builder, flags, &ProjectLayout::default(), &reporter).await;
  assert!(result.is_err());
  assert_eq!(out.lines(), vec!["[watch] build finished for ./src/client.ts"]);

  // The sender only goes away once the host's watch task has been dropped.
  let stopped = tokio::time::timeout(std::time::Duration::from_secs(1), stopped).await;
  assert!(matches!(stopped, Ok(Err(_))));
}

#[tokio::test]
async fn test_submitted_configs_follow_flags() {
  let builder = FakeBuilder::default();
  let (reporter, _, _) = crate::reporter::memory_reporter();
  let flags = BuildFlags { minify: true, ..BuildFlags::default() };

  run(&builder, flags, &ProjectLayout::default(), &reporter).await.unwrap();

  let submitted = builder.submitted.lock().unwrap();
  assert!(submitted.iter().all(|options| options.minify && !options.watch.is_enabled()));
}

#[tokio::test]
async fn test_watchers_are_awaited() {
  let builder = FakeBuilder { watch: true, ..FakeBuilder::default() };
  let (reporter, out, _) = crate::reporter::memory_reporter();
  let flags = BuildFlags { watch: true, ..BuildFlags::default() };

  let handles = run(&builder, flags, &ProjectLayout::default(), &reporter).await.unwrap();
  assert!(handles.iter().all(|handle| handle.watcher.is_some()));
  wait_for_watchers(handles).await;

  let lines = out.lines();
  assert!(lines.contains(&"[watch] build finished (rebuild for ./src/client.ts)".to_string()));
  assert!(lines.contains(&"[watch] build finished (rebuild for ./views/info/index.tsx)".to_string()));
}

#[tokio::test]
async fn test_no_watchers_returns_immediately() {
  let handles = vec![BuildHandle::new(extbuild_common::BuildOutput::default())];
  tokio::time::timeout(std::time::Duration::from_secs(1), wait_for_watchers(handles)).await.unwrap();
}
