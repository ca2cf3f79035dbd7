mod builder;
mod esbuild;
mod flags;
mod orchestrator;
mod reporter;
mod targets;
mod watch;

pub use crate::{
  builder::{BuildHandle, Builder, Watcher},
  esbuild::{EsbuildBinary, EsbuildBuilder, ESBUILD_BINARY_PATH},
  flags::BuildFlags,
  orchestrator::{run, run_builds, wait_for_watchers},
  reporter::Reporter,
  targets::{build_targets, extension_host_options, webview_options, ProjectLayout},
  watch::{report_errors, watch_config},
};
pub use extbuild_common::*;
pub use extbuild_error::{BuildDiagnostic, BuildError, BuildResult, Location};
