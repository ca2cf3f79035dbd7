use std::path::PathBuf;

use extbuild_common::{BuildOptions, OutputFormat, OutputTarget, Platform, SourceMapType};

use crate::{watch_config, BuildFlags, Reporter};

/// Where the sources of the extension live and where its bundles go, relative
/// to the project root.
#[derive(Debug, Clone)]
pub struct ProjectLayout {
  pub extension_entry: String,
  pub extension_outfile: PathBuf,
  /// Modules the editor provides at load time.
  pub extension_externals: Vec<String>,
  pub webview_entries: Vec<String>,
  pub webview_outdir: PathBuf,
  pub webview_outbase: PathBuf,
}

impl Default for ProjectLayout {
  fn default() -> Self {
    Self {
      extension_entry: "./src/client.ts".to_string(),
      extension_outfile: PathBuf::from("out/src/client.js"),
      extension_externals: vec!["vscode".to_string()],
      webview_entries: vec!["./views/info/index.tsx".to_string()],
      webview_outdir: PathBuf::from("out"),
      webview_outbase: PathBuf::from("."),
    }
  }
}

/// The extension runs in the editor's Node-based extension host, hence a single
/// cjs file for `node`.
pub fn extension_host_options(
  flags: BuildFlags,
  layout: &ProjectLayout,
  reporter: &Reporter,
) -> BuildOptions {
  let entry = layout.extension_entry.as_str();
  BuildOptions {
    input: vec![entry.into()],
    platform: Platform::Node,
    external: layout.extension_externals.clone(),
    output: OutputTarget::File(layout.extension_outfile.clone()),
    format: Some(OutputFormat::Cjs),
    bundle: true,
    minify: flags.minify,
    sourcemap: (!flags.disable_sourcemap).then_some(SourceMapType::Linked),
    watch: watch_config(flags, entry, reporter),
  }
}

/// Webviews load as a single document, so their source maps are inlined.
pub fn webview_options(
  flags: BuildFlags,
  layout: &ProjectLayout,
  entry: &str,
  reporter: &Reporter,
) -> BuildOptions {
  BuildOptions {
    input: vec![entry.into()],
    platform: Platform::Browser,
    external: Vec::new(),
    output: OutputTarget::Dir {
      dir: layout.webview_outdir.clone(),
      base: layout.webview_outbase.clone(),
    },
    format: None,
    bundle: true,
    minify: flags.minify,
    sourcemap: (!flags.disable_sourcemap).then_some(SourceMapType::Inline),
    watch: watch_config(flags, entry, reporter),
  }
}

/// The extension host build followed by one build per webview entry.
pub fn build_targets(
  flags: BuildFlags,
  layout: &ProjectLayout,
  reporter: &Reporter,
) -> Vec<BuildOptions> {
  std::iter::once(extension_host_options(flags, layout, reporter))
    .chain(layout.webview_entries.iter().map(|entry| webview_options(flags, layout, entry, reporter)))
    .collect()
}

#[cfg(test)]
fn default_targets(flags: BuildFlags) -> (BuildOptions, BuildOptions) {
  let (reporter, _, _) = crate::reporter::memory_reporter();
  let mut targets = build_targets(flags, &ProjectLayout::default(), &reporter).into_iter();
  let host = targets.next().expect("extension host target");
  let webview = targets.next().expect("webview target");
  assert!(targets.next().is_none());
  (host, webview)
}

#[test]
fn test_default_flags_enable_sourcemaps_per_target() {
  let (host, webview) = default_targets(BuildFlags::default());
  assert_eq!(host.sourcemap, Some(SourceMapType::Linked));
  assert_eq!(host.sourcemap.map(|mode| mode.to_string()).as_deref(), Some("true"));
  assert_eq!(webview.sourcemap, Some(SourceMapType::Inline));
}

#[test]
fn test_disabled_sourcemap_is_omitted_everywhere() {
  let (host, webview) = default_targets(BuildFlags { disable_sourcemap: true, ..BuildFlags::default() });
  assert_eq!(host.sourcemap, None);
  assert_eq!(webview.sourcemap, None);
}

#[test]
fn test_minify_only() {
  let (host, webview) = default_targets(BuildFlags { minify: true, ..BuildFlags::default() });
  for options in [&host, &webview] {
    assert!(options.minify);
    assert!(!options.watch.is_enabled());
    assert_eq!(options.watch.to_string(), "false");
  }
  assert_eq!(host.sourcemap, Some(SourceMapType::Linked));
  assert_eq!(webview.sourcemap, Some(SourceMapType::Inline));
}

#[test]
fn test_watch_binds_handler_to_each_entry() {
  let (host, webview) = default_targets(BuildFlags { watch: true, ..BuildFlags::default() });
  assert_eq!(host.watch.handler().map(|handler| handler.entry()), Some("./src/client.ts"));
  assert_eq!(webview.watch.handler().map(|handler| handler.entry()), Some("./views/info/index.tsx"));
}

#[test]
fn test_extension_host_shape() {
  let (host, _) = default_targets(BuildFlags::default());
  assert_eq!(host.entry_label(), "./src/client.ts");
  assert_eq!(host.platform, Platform::Node);
  assert_eq!(host.format, Some(OutputFormat::Cjs));
  assert_eq!(host.external, vec!["vscode".to_string()]);
  assert_eq!(host.output, OutputTarget::File(PathBuf::from("out/src/client.js")));
  assert!(host.bundle);
}

#[test]
fn test_webview_shape() {
  let (_, webview) = default_targets(BuildFlags::default());
  assert_eq!(webview.entry_label(), "./views/info/index.tsx");
  assert_eq!(webview.platform, Platform::Browser);
  assert_eq!(webview.format, None);
  assert!(webview.external.is_empty());
  assert_eq!(webview.output, OutputTarget::Dir { dir: PathBuf::from("out"), base: PathBuf::from(".") });
}

#[test]
fn test_every_webview_entry_gets_a_build() {
  let (reporter, _, _) = crate::reporter::memory_reporter();
  let layout = ProjectLayout {
    webview_entries: vec!["./views/info/index.tsx".into(), "./views/goals/index.tsx".into()],
    ..ProjectLayout::default()
  };
  let targets = build_targets(BuildFlags::default(), &layout, &reporter);
  let labels: Vec<_> = targets.iter().map(BuildOptions::entry_label).collect();
  assert_eq!(labels, vec!["./src/client.ts", "./views/info/index.tsx", "./views/goals/index.tsx"]);
}
