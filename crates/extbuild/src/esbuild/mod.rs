mod args;
mod binary;
mod log_parser;
mod log_stream;

use std::{
  path::{Path, PathBuf},
  process::Stdio,
};

use anyhow::Context;
use extbuild_common::{AssetKind, BuildOptions, BuildOutput, OutputAsset, WatchHandler};
#[cfg(test)]
use extbuild_common::WatchOption;
use extbuild_error::BuildResult;
use sugar_path::SugarPath;
use tokio::process::{Child, ChildStderr, Command};

pub use self::binary::{EsbuildBinary, ESBUILD_BINARY_PATH};
use self::{args::esbuild_args, log_stream::LogStream};
use crate::{BuildHandle, Builder, Watcher};

/// Runs every build as an `esbuild` child process in the project root.
#[derive(Debug, Clone)]
pub struct EsbuildBuilder {
  binary: EsbuildBinary,
  cwd: PathBuf,
}

impl EsbuildBuilder {
  pub fn new(binary: EsbuildBinary, cwd: impl Into<PathBuf>) -> Self {
    Self { binary, cwd: cwd.into() }
  }

  pub fn locate(cwd: impl Into<PathBuf>) -> BuildResult<Self> {
    let cwd = cwd.into();
    let binary = EsbuildBinary::locate(&cwd)?;
    tracing::debug!(esbuild = %binary.path().display(), "using esbuild");
    Ok(Self::new(binary, cwd))
  }

  fn spawn(&self, options: &BuildOptions) -> anyhow::Result<(Child, LogStream<ChildStderr>)> {
    let args = esbuild_args(options);
    tracing::debug!(entry = options.entry_label(), "esbuild {}", args.join(" "));

    let mut child = Command::new(self.binary.path())
      .args(&args)
      .current_dir(&self.cwd)
      .stdin(Stdio::null())
      .stdout(Stdio::null())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .spawn()
      .with_context(|| format!("failed to spawn {}", self.binary.path().display()))?;

    let stderr = child.stderr.take().context("esbuild stderr is not captured")?;
    Ok((child, LogStream::new(stderr)))
  }

  async fn build_once(&self, options: BuildOptions) -> BuildResult<BuildHandle> {
    let (mut child, mut log) = self.spawn(&options)?;

    // Without --watch there are no cycle markers, everything lands in the remainder.
    while log.next_cycle().await.context("failed to read esbuild output")?.is_some() {}
    let status = child.wait().await.context("failed to wait for esbuild")?;
    let cycle = log.into_remaining();

    if !status.success() {
      return Err(cycle.into_error(status));
    }
    let warnings = cycle.into_result()?;
    let assets = collect_assets(&options, &self.cwd).await;
    Ok(BuildHandle::new(BuildOutput { warnings, assets }))
  }

  async fn build_watching(
    &self,
    options: BuildOptions,
    handler: WatchHandler,
  ) -> BuildResult<BuildHandle> {
    let (mut child, mut log) = self.spawn(&options)?;

    let Some(initial) = log.next_cycle().await.context("failed to read esbuild output")? else {
      let status = child.wait().await.context("failed to wait for esbuild")?;
      return Err(log.into_remaining().into_error(status));
    };
    // Dropping `child` on error kills the watching esbuild.
    let warnings = initial.into_result()?;
    let output = BuildOutput { warnings, assets: collect_assets(&options, &self.cwd).await };

    let entry = options.entry_label().to_string();
    let cwd = self.cwd.clone();
    let task = tokio::spawn(async move {
      loop {
        match log.next_cycle().await {
          Ok(Some(cycle)) => match cycle.into_result() {
            Ok(warnings) => {
              let output = BuildOutput { warnings, assets: collect_assets(&options, &cwd).await };
              handler.on_rebuild(None, Some(&output));
            }
            Err(error) => handler.on_rebuild(Some(&error), None),
          },
          Ok(None) => break,
          Err(err) => {
            tracing::warn!(entry = handler.entry(), "failed to read esbuild output: {err}");
            break;
          }
        }
      }

      match child.wait().await {
        Ok(status) => tracing::debug!(entry = handler.entry(), "esbuild stopped watching ({status})"),
        Err(err) => tracing::warn!(entry = handler.entry(), "failed to wait for esbuild: {err}"),
      }
    });

    Ok(BuildHandle::new(output).with_watcher(Watcher::new(entry, task)))
  }
}

impl Builder for EsbuildBuilder {
  async fn build(&self, options: BuildOptions) -> BuildResult<BuildHandle> {
    match options.watch.handler().cloned() {
      Some(handler) => self.build_watching(options, handler).await,
      None => self.build_once(options).await,
    }
  }
}

/// The outputs of `options` that exist on disk, with their sizes.
async fn collect_assets(options: &BuildOptions, cwd: &Path) -> Vec<OutputAsset> {
  let mut assets = Vec::new();
  for path in options.expected_outputs() {
    match tokio::fs::metadata(cwd.join(&path)).await {
      Ok(metadata) if metadata.is_file() => assets.push(OutputAsset {
        filename: path.to_slash_lossy().into_owned(),
        kind: AssetKind::from_path(&path),
        size: metadata.len(),
      }),
      Ok(_) => {}
      Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
      Err(err) => tracing::warn!("failed to stat {}: {err}", path.display()),
    }
  }
  assets
}

#[cfg(test)]
fn host_options(watch: WatchOption) -> BuildOptions {
  use extbuild_common::{OutputTarget, Platform, SourceMapType};

  BuildOptions {
    input: vec!["./src/client.ts".into()],
    platform: Platform::Node,
    external: vec!["vscode".to_string()],
    output: OutputTarget::File(PathBuf::from("out/src/client.js")),
    format: None,
    bundle: true,
    minify: false,
    sourcemap: Some(SourceMapType::Linked),
    watch,
  }
}

/// A project whose entry is a shell script standing in for esbuild: the
/// builder runs `/bin/sh ./src/client.ts <esbuild arguments>`.
#[cfg(all(test, unix))]
async fn fake_esbuild_project(name: &str, script: &str) -> (PathBuf, EsbuildBuilder) {
  let cwd = std::env::temp_dir().join(format!("extbuild-{name}-{}", std::process::id()));
  tokio::fs::create_dir_all(cwd.join("src")).await.unwrap();
  tokio::fs::write(cwd.join("src/client.ts"), script).await.unwrap();
  let builder = EsbuildBuilder::new(EsbuildBinary::new("/bin/sh"), &cwd);
  (cwd, builder)
}

#[tokio::test]
async fn test_assets_skip_missing_outputs() {
  let cwd = std::env::temp_dir().join(format!("extbuild-assets-{}", std::process::id()));
  tokio::fs::create_dir_all(cwd.join("out/src")).await.unwrap();
  tokio::fs::write(cwd.join("out/src/client.js"), b"module.exports = {};\n").await.unwrap();

  let assets = collect_assets(&host_options(WatchOption::Disabled), &cwd).await;
  tokio::fs::remove_dir_all(&cwd).await.unwrap();

  assert_eq!(
    assets,
    vec![OutputAsset { filename: "out/src/client.js".to_string(), kind: AssetKind::Chunk, size: 21 }]
  );
}

#[tokio::test]
async fn test_missing_executable_is_a_build_error() {
  let builder = EsbuildBuilder::new(EsbuildBinary::new("/nonexistent/esbuild"), std::env::temp_dir());
  let error = builder.build(host_options(WatchOption::Disabled)).await.unwrap_err();
  assert!(error[0].text.starts_with("failed to spawn /nonexistent/esbuild"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_one_shot_failure_carries_the_located_error() {
  use extbuild_error::Location;

  let (cwd, builder) = fake_esbuild_project(
    "one-shot-failure",
    r#"cat >&2 <<'LOG'
✘ [ERROR] Unexpected end of file

    src/client.ts:20:0:

1 error
LOG
exit 1
"#,
  )
  .await;

  let result = builder.build(host_options(WatchOption::Disabled)).await;
  tokio::fs::remove_dir_all(&cwd).await.unwrap();

  let error = result.unwrap_err();
  assert_eq!(error.len(), 1);
  assert_eq!(error[0].text, "Unexpected end of file");
  assert_eq!(
    error[0].location,
    Some(Location { file: "src/client.ts".to_string(), line: 20, column: 0 })
  );
}

#[cfg(unix)]
#[tokio::test]
async fn test_one_shot_success_reports_warnings_and_assets() {
  let (cwd, builder) = fake_esbuild_project(
    "one-shot-success",
    r#"mkdir -p out/src
printf 'x' > out/src/client.js
cat >&2 <<'LOG'
▲ [WARNING] Duplicate key "id" in object literal

    src/client.ts:4:2:

LOG
"#,
  )
  .await;

  let result = builder.build(host_options(WatchOption::Disabled)).await;
  tokio::fs::remove_dir_all(&cwd).await.unwrap();

  let handle = result.unwrap();
  assert!(handle.watcher.is_none());
  assert_eq!(handle.output.warnings.len(), 1);
  assert_eq!(handle.output.warnings[0].text, "Duplicate key \"id\" in object literal");
  assert_eq!(
    handle.output.assets,
    vec![OutputAsset { filename: "out/src/client.js".to_string(), kind: AssetKind::Chunk, size: 1 }]
  );
}

#[cfg(unix)]
#[tokio::test]
async fn test_watch_rebuilds_reach_the_handler() {
  use crate::{reporter::memory_reporter, watch_config, BuildFlags};

  let (cwd, builder) = fake_esbuild_project(
    "watch",
    r#"mkdir -p out/src
printf 'x' > out/src/client.js
cat >&2 <<'LOG'
[watch] build finished, watching for changes...
[watch] build started (change: "src/client.ts")
✘ [ERROR] Unexpected end of file

    src/client.ts:20:0:

1 error
[watch] build finished
[watch] build started (change: "src/client.ts")
[watch] build finished
LOG
"#,
  )
  .await;

  let (reporter, out, err) = memory_reporter();
  let flags = BuildFlags { watch: true, ..BuildFlags::default() };
  let options = host_options(watch_config(flags, "./src/client.ts", &reporter));

  let mut handle = builder.build(options).await.unwrap();
  assert!(handle.output.warnings.is_empty());
  assert_eq!(handle.output.assets.len(), 1);

  let watcher = handle.watcher.take().unwrap();
  assert_eq!(watcher.entry(), "./src/client.ts");
  // The fake exits after its last rebuild, which ends the watch.
  tokio::time::timeout(std::time::Duration::from_secs(10), watcher.stopped()).await.unwrap();
  tokio::fs::remove_dir_all(&cwd).await.unwrap();

  assert_eq!(err.lines(), vec!["> src/client.ts:20:0: error: Unexpected end of file"]);
  assert_eq!(
    out.lines(),
    vec![
      "[watch] build started (rebuild for ./src/client.ts)",
      "[watch] build started (rebuild for ./src/client.ts)",
      "[watch] build finished (rebuild for ./src/client.ts)",
    ]
  );
}

#[cfg(unix)]
#[tokio::test]
async fn test_watch_initial_failure_fails_the_build() {
  use crate::{reporter::memory_reporter, watch_config, BuildFlags};

  let (cwd, builder) = fake_esbuild_project(
    "watch-failure",
    r#"cat >&2 <<'LOG'
✘ [ERROR] Could not resolve "./missing"

    src/client.ts:3:21:

1 error
[watch] build finished, watching for changes...
LOG
exec sleep 30
"#,
  )
  .await;

  let (reporter, out, _) = memory_reporter();
  let flags = BuildFlags { watch: true, ..BuildFlags::default() };
  let options = host_options(watch_config(flags, "./src/client.ts", &reporter));

  let result = builder.build(options).await;
  tokio::fs::remove_dir_all(&cwd).await.unwrap();

  let error = result.unwrap_err();
  assert_eq!(error[0].text, "Could not resolve \"./missing\"");
  assert!(out.lines().is_empty());
}
