mod args;

use std::{process::ExitCode, time::Instant};

use ansi_term::Colour;
use extbuild::{
  report_errors, run, wait_for_watchers, BuildFlags, BuildHandle, Builder, EsbuildBuilder,
  ProjectLayout, Reporter,
};
use tracing_subscriber::EnvFilter;

/// Exit status when any build fails.
const BUILD_FAILED: u8 = 1;

fn init_tracing() {
  tracing_subscriber::fmt()
    .with_writer(std::io::stderr)
    .with_target(false)
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    )
    .init();
}

#[allow(clippy::cast_precision_loss)]
fn print_output_assets(reporter: &Reporter, handles: &[BuildHandle]) {
  let mut left = 0;
  let mut right = 0;

  let mut assets = Vec::new();

  for asset in handles.iter().flat_map(|handle| &handle.output.assets) {
    let size = format!("{:.2}", asset.size as f64 / 1024.0);

    if size.len() > right {
      right = size.len();
    }

    if asset.filename.len() > left {
      left = asset.filename.len();
    }

    assets.push((asset.filename.as_str(), size, asset.kind.as_str()));
  }

  let dim = Colour::White.dimmed();
  let color = Colour::Cyan;

  for (filename, size, kind) in assets {
    reporter.info(format_args!(
      "{}{:left$} {}{}{:right$}{} kB",
      color.paint(filename),
      "",
      dim.paint(format!("{kind:5}")),
      dim.paint(" │ size: "),
      "",
      size,
      left = left - filename.len(),
      right = right - size.len()
    ));
  }
}

fn print_warnings(reporter: &Reporter, handles: &[BuildHandle]) {
  for warning in handles.iter().flat_map(|handle| &handle.output.warnings) {
    match &warning.location {
      Some(location) => {
        reporter.error(format_args!("{} {location}: {}", Colour::Yellow.paint("Warning:"), warning.text));
      }
      None => reporter.error(format_args!("{} {}", Colour::Yellow.paint("Warning:"), warning.text)),
    }
  }
}

/// Runs every build of the default project layout. A failure has its
/// diagnostics printed and turns into the process exit status.
async fn build_project<B: Builder>(
  builder: &B,
  flags: BuildFlags,
  reporter: &Reporter,
) -> Result<Vec<BuildHandle>, u8> {
  run(builder, flags, &ProjectLayout::default(), reporter).await.map_err(|error| {
    report_errors(reporter, &error);
    BUILD_FAILED
  })
}

#[tokio::main]
async fn main() -> ExitCode {
  init_tracing();

  let flags = match args::parse_flags(std::env::args_os()) {
    Ok(flags) => flags,
    Err(err) => {
      // --help or --version
      if let Err(err) = err.print() {
        tracing::warn!("failed to print usage: {err}");
      }
      return ExitCode::SUCCESS;
    }
  };
  tracing::debug!(?flags, "parsed build flags");

  let reporter = Reporter::stdio();
  let cwd = match std::env::current_dir() {
    Ok(cwd) => cwd,
    Err(err) => {
      tracing::error!("cannot read the current directory: {err}");
      return ExitCode::FAILURE;
    }
  };

  let builder = match EsbuildBuilder::locate(cwd) {
    Ok(builder) => builder,
    Err(error) => {
      report_errors(&reporter, &error);
      return ExitCode::FAILURE;
    }
  };

  let start = Instant::now();
  let handles = match build_project(&builder, flags, &reporter).await {
    Ok(handles) => handles,
    Err(code) => return ExitCode::from(code),
  };

  print_warnings(&reporter, &handles);

  if flags.watch {
    let watching = wait_for_watchers(handles);
    tokio::pin!(watching);
    tokio::select! {
      () = &mut watching => {}
      result = tokio::signal::ctrl_c() => {
        if let Err(err) = result {
          tracing::warn!("failed to listen for ctrl-c: {err}");
          watching.await;
        }
      }
    }
    return ExitCode::SUCCESS;
  }

  print_output_assets(&reporter, &handles);
  let elapsed = format!("{:.2} ms", start.elapsed().as_secs_f64() * 1000.0);
  reporter.info(format_args!(
    "\n{} Finished in {}",
    Colour::Green.paint("✔"),
    Colour::White.bold().paint(elapsed)
  ));

  ExitCode::SUCCESS
}

#[cfg(test)]
#[derive(Clone, Default)]
struct Captured(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

#[cfg(test)]
impl std::io::Write for Captured {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    self.0.lock().unwrap().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> std::io::Result<()> {
    Ok(())
  }
}

#[cfg(test)]
impl Captured {
  fn text(&self) -> String {
    String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
  }
}

/// Fails the webview build with a located error, succeeds everything else.
#[cfg(test)]
struct WebviewFails;

#[cfg(test)]
impl Builder for WebviewFails {
  async fn build(&self, options: extbuild::BuildOptions) -> extbuild::BuildResult<BuildHandle> {
    if options.platform == extbuild::Platform::Browser {
      return Err(
        extbuild::BuildDiagnostic::new("Expected \">\" but found \"<\"")
          .with_location(extbuild::Location {
            file: "views/info/index.tsx".to_string(),
            line: 7,
            column: 3,
          })
          .into(),
      );
    }
    Ok(BuildHandle::new(extbuild::BuildOutput::default()))
  }
}

#[cfg(test)]
struct AllSucceed;

#[cfg(test)]
impl Builder for AllSucceed {
  async fn build(&self, _options: extbuild::BuildOptions) -> extbuild::BuildResult<BuildHandle> {
    Ok(BuildHandle::new(extbuild::BuildOutput::default()))
  }
}

#[tokio::test]
async fn test_failed_build_exits_with_failure_status() {
  let (out, err) = (Captured::default(), Captured::default());
  let reporter = Reporter::new(out.clone(), err.clone());

  let result = build_project(&WebviewFails, BuildFlags::default(), &reporter).await;

  assert_eq!(result.err(), Some(BUILD_FAILED));
  assert_eq!(err.text(), "> views/info/index.tsx:7:3: error: Expected \">\" but found \"<\"\n");
}

#[tokio::test]
async fn test_successful_build_returns_every_target() {
  let (out, err) = (Captured::default(), Captured::default());
  let reporter = Reporter::new(out.clone(), err.clone());

  let handles = build_project(&AllSucceed, BuildFlags::default(), &reporter).await.unwrap();

  assert_eq!(handles.len(), 2);
  assert!(err.text().is_empty());
  assert_eq!(
    out.text(),
    "[watch] build finished for ./src/client.ts\n[watch] build finished for ./views/info/index.tsx\n"
  );
}
