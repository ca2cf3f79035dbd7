pub mod input_item;
pub mod output_format;
pub mod output_target;
pub mod platform;
pub mod source_map_type;
pub mod watch_option;

use std::path::PathBuf;

use crate::{InputItem, OutputFormat, OutputTarget, Platform, SourceMapType, WatchOption};

/// One build submitted to the bundler. `None` fields are left out of the
/// bundler invocation entirely so the bundler default applies.
#[derive(Debug, Clone)]
pub struct BuildOptions {
  // --- Input
  pub input: Vec<InputItem>,
  pub platform: Platform,
  pub external: Vec<String>,

  // --- Output
  pub output: OutputTarget,
  pub format: Option<OutputFormat>,
  pub bundle: bool,
  pub minify: bool,
  pub sourcemap: Option<SourceMapType>,

  // --- Watch
  pub watch: WatchOption,
}

impl BuildOptions {
  /// The label used in progress messages, the first entry as written in the config.
  pub fn entry_label(&self) -> &str {
    self.input.first().map_or("", |item| item.import.as_str())
  }

  /// Every file a successful build of these options may have written.
  /// Stylesheets are only emitted when an entry imports css, so callers should
  /// expect some of these to be missing.
  pub fn expected_outputs(&self) -> Vec<PathBuf> {
    // A single output file holds every entry.
    let entries = match self.output {
      OutputTarget::File(_) => &self.input[..self.input.len().min(1)],
      OutputTarget::Dir { .. } => &self.input[..],
    };

    let mut outputs = Vec::with_capacity(entries.len() * 2);
    for item in entries {
      let bundle = self.output.bundle_path(item);
      outputs.push(bundle.clone());
      if matches!(self.sourcemap, Some(SourceMapType::Linked)) {
        let mut map = bundle.clone().into_os_string();
        map.push(".map");
        outputs.push(PathBuf::from(map));
      }
      if matches!(self.output, OutputTarget::Dir { .. }) {
        outputs.push(bundle.with_extension("css"));
      }
    }
    outputs
  }
}

#[cfg(test)]
fn host_options(sourcemap: Option<SourceMapType>) -> BuildOptions {
  BuildOptions {
    input: vec!["./src/client.ts".into()],
    platform: Platform::Node,
    external: vec!["vscode".to_string()],
    output: OutputTarget::File(PathBuf::from("out/src/client.js")),
    format: Some(OutputFormat::Cjs),
    bundle: true,
    minify: false,
    sourcemap,
    watch: WatchOption::Disabled,
  }
}

#[test]
fn test_linked_sourcemap_adds_map_file() {
  let outputs = host_options(Some(SourceMapType::Linked)).expected_outputs();
  assert_eq!(outputs, vec![PathBuf::from("out/src/client.js"), PathBuf::from("out/src/client.js.map")]);

  let outputs = host_options(None).expected_outputs();
  assert_eq!(outputs, vec![PathBuf::from("out/src/client.js")]);
}

#[test]
fn test_inline_sourcemap_has_no_companion() {
  let options = BuildOptions {
    input: vec!["./views/info/index.tsx".into()],
    platform: Platform::Browser,
    external: vec![],
    output: OutputTarget::Dir { dir: PathBuf::from("out"), base: PathBuf::from(".") },
    format: None,
    bundle: true,
    minify: false,
    sourcemap: Some(SourceMapType::Inline),
    watch: WatchOption::Disabled,
  };
  let index = PathBuf::from("out").join("views").join("info").join("index.js");
  assert_eq!(options.expected_outputs(), vec![index.clone(), index.with_extension("css")]);
  assert_eq!(options.entry_label(), "./views/info/index.tsx");
}
