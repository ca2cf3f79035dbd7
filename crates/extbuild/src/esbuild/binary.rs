use std::{
  ffi::OsString,
  path::{Path, PathBuf},
};

use anyhow::Context;

/// Overrides where the esbuild executable is looked up, the same variable the
/// esbuild npm package honours.
pub const ESBUILD_BINARY_PATH: &str = "ESBUILD_BINARY_PATH";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EsbuildBinary {
  path: PathBuf,
}

impl EsbuildBinary {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  /// `ESBUILD_BINARY_PATH`, then the project's own `node_modules/.bin/esbuild`,
  /// then `esbuild` on `PATH`.
  pub fn locate(cwd: &Path) -> anyhow::Result<Self> {
    Self::locate_with(std::env::var_os(ESBUILD_BINARY_PATH), cwd)
  }

  fn locate_with(env_override: Option<OsString>, cwd: &Path) -> anyhow::Result<Self> {
    if let Some(path) = env_override.filter(|path| !path.is_empty()) {
      return Ok(Self::new(path));
    }

    let local = cwd.join("node_modules").join(".bin").join(if cfg!(windows) { "esbuild.cmd" } else { "esbuild" });
    if local.is_file() {
      return Ok(Self::new(local));
    }

    which::which("esbuild").map(Self::new).context(
      "could not find esbuild, install it with `npm install --save-dev esbuild` or set ESBUILD_BINARY_PATH",
    )
  }
}

#[test]
fn test_env_override_wins() {
  let binary = EsbuildBinary::locate_with(Some("/opt/esbuild/bin/esbuild".into()), Path::new("."));
  assert_eq!(binary.unwrap().path(), Path::new("/opt/esbuild/bin/esbuild"));
}

#[test]
fn test_empty_override_is_ignored() {
  let cwd = Path::new("/nonexistent/extbuild-project");
  let located = EsbuildBinary::locate_with(Some(OsString::new()), cwd);
  // Falls through to PATH lookup, which depends on the machine.
  if let Ok(binary) = located {
    assert_ne!(binary.path(), Path::new(""));
  }
}
