use std::ffi::OsString;

use clap::{error::ErrorKind, Parser, ValueEnum};
use extbuild::BuildFlags;

#[derive(PartialEq, Eq, Clone, Copy, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum SourcemapSwitch {
  Yes,
  No,
}

/// Builds the extension host and webview bundles of a VS Code extension with esbuild.
#[derive(Parser)]
#[command(name = "extbuild", version, about, long_about = None)]
pub struct Commands {
  /// Keep esbuild running and report every rebuild
  #[clap(long)]
  pub watch: bool,

  /// Minify every bundle
  #[clap(long)]
  pub minify: bool,

  /// `--sourcemap=no` disables source maps for every bundle
  #[clap(long, value_name = "MODE", require_equals = true)]
  pub sourcemap: Option<SourcemapSwitch>,
}

impl From<Commands> for BuildFlags {
  fn from(value: Commands) -> Self {
    Self {
      watch: value.watch,
      minify: value.minify,
      disable_sourcemap: value.sourcemap == Some(SourcemapSwitch::No),
    }
  }
}

/// Reads the build flags from `args`, the first item being the program name.
///
/// Every argument is parsed on its own and anything clap does not accept is
/// skipped, so unknown arguments never fail the build. Only `--help` and
/// `--version` come back as errors, for the caller to print.
pub fn parse_flags<I, T>(args: I) -> Result<BuildFlags, clap::Error>
where
  I: IntoIterator<Item = T>,
  T: Into<OsString>,
{
  let mut args = args.into_iter().map(Into::into);
  let bin = args.next().unwrap_or_else(|| OsString::from("extbuild"));

  let mut flags = BuildFlags::default();
  for arg in args {
    match Commands::try_parse_from([bin.clone(), arg.clone()]) {
      Ok(commands) => flags = flags.union(commands.into()),
      Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
        return Err(err);
      }
      Err(_) => tracing::debug!("ignoring argument {}", arg.to_string_lossy()),
    }
  }
  Ok(flags)
}

#[cfg(test)]
fn flags(args: &[&str]) -> BuildFlags {
  parse_flags(std::iter::once("extbuild").chain(args.iter().copied())).unwrap()
}

#[test]
fn test_no_arguments() {
  assert_eq!(flags(&[]), BuildFlags::default());
}

#[test]
fn test_every_subset_in_any_order() {
  let all = ["--watch", "--minify", "--sourcemap=no"];
  for mask in 0..8u8 {
    let mut args: Vec<&str> =
      all.iter().enumerate().filter(|(i, _)| mask & (1 << i) != 0).map(|(_, arg)| *arg).collect();
    let expected =
      BuildFlags { watch: mask & 1 != 0, minify: mask & 2 != 0, disable_sourcemap: mask & 4 != 0 };
    assert_eq!(flags(&args), expected);

    args.reverse();
    assert_eq!(flags(&args), expected);
  }
}

#[test]
fn test_duplicates_are_harmless() {
  let parsed = flags(&["--minify", "--minify", "--sourcemap=no", "--sourcemap=no"]);
  assert_eq!(parsed, BuildFlags { watch: false, minify: true, disable_sourcemap: true });
}

#[test]
fn test_unknown_arguments_are_ignored() {
  let parsed = flags(&["--verbose", "--watch", "src/client.ts", "--minify=false"]);
  assert_eq!(parsed, BuildFlags { watch: true, ..BuildFlags::default() });
}

#[test]
fn test_only_the_literal_sourcemap_no_disables() {
  assert!(!flags(&["--sourcemap=yes"]).disable_sourcemap);
  assert!(!flags(&["--sourcemap=inline"]).disable_sourcemap);
  assert!(!flags(&["--sourcemap", "no"]).disable_sourcemap);
  assert!(flags(&["--sourcemap=no"]).disable_sourcemap);
}

#[test]
fn test_help_is_reported() {
  let err = parse_flags(["extbuild", "--help"]).unwrap_err();
  assert_eq!(err.kind(), ErrorKind::DisplayHelp);
}
