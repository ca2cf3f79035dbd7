use extbuild_common::{BuildOptions, OutputTarget, SourceMapType};
use sugar_path::SugarPath;

/// The esbuild command line equivalent to `options`.
pub fn esbuild_args(options: &BuildOptions) -> Vec<String> {
  let mut args = Vec::with_capacity(options.input.len() + options.external.len() + 10);

  for item in &options.input {
    match &item.name {
      Some(name) => args.push(format!("{name}={}", item.import)),
      None => args.push(item.import.clone()),
    }
  }

  if options.bundle {
    args.push("--bundle".to_string());
  }

  match options.sourcemap {
    Some(SourceMapType::Linked) => args.push("--sourcemap".to_string()),
    Some(SourceMapType::Inline) => args.push("--sourcemap=inline".to_string()),
    None => {}
  }

  if let Some(format) = options.format {
    args.push(format!("--format={format}"));
  }
  args.push(format!("--platform={}", options.platform));

  for module in &options.external {
    args.push(format!("--external:{module}"));
  }

  match &options.output {
    OutputTarget::File(file) => args.push(format!("--outfile={}", file.to_slash_lossy())),
    OutputTarget::Dir { dir, base } => {
      args.push(format!("--outdir={}", dir.to_slash_lossy()));
      args.push(format!("--outbase={}", base.to_slash_lossy()));
    }
  }

  if options.minify {
    args.push("--minify".to_string());
  }

  // The watch markers are only printed at the info level.
  if options.watch.is_enabled() {
    args.push("--watch=forever".to_string());
    args.push("--log-level=info".to_string());
  } else {
    args.push("--log-level=warning".to_string());
  }
  args.push("--color=false".to_string());

  args
}

#[cfg(test)]
use std::path::PathBuf;
#[cfg(test)]
use extbuild_common::{InputItem, OutputFormat, Platform, WatchHandler, WatchOption};

#[cfg(test)]
fn host(sourcemap: Option<SourceMapType>, minify: bool) -> BuildOptions {
  BuildOptions {
    input: vec!["./src/client.ts".into()],
    platform: Platform::Node,
    external: vec!["vscode".to_string()],
    output: OutputTarget::File(PathBuf::from("out/src/client.js")),
    format: Some(OutputFormat::Cjs),
    bundle: true,
    minify,
    sourcemap,
    watch: WatchOption::Disabled,
  }
}

#[test]
fn test_extension_host_command_line() {
  assert_eq!(
    esbuild_args(&host(Some(SourceMapType::Linked), false)),
    vec![
      "./src/client.ts",
      "--bundle",
      "--sourcemap",
      "--format=cjs",
      "--platform=node",
      "--external:vscode",
      "--outfile=out/src/client.js",
      "--log-level=warning",
      "--color=false",
    ]
  );
}

#[test]
fn test_omitted_sourcemap_and_minify() {
  let args = esbuild_args(&host(None, true));
  assert!(!args.iter().any(|arg| arg.starts_with("--sourcemap")));
  assert!(args.contains(&"--minify".to_string()));
}

#[test]
fn test_webview_command_line_in_watch_mode() {
  let options = BuildOptions {
    input: vec![InputItem::from("./views/info/index.tsx")],
    platform: Platform::Browser,
    external: Vec::new(),
    output: OutputTarget::Dir { dir: PathBuf::from("out"), base: PathBuf::from(".") },
    format: None,
    bundle: true,
    minify: false,
    sourcemap: Some(SourceMapType::Inline),
    watch: WatchOption::Enabled(WatchHandler::new("./views/info/index.tsx", |_, _| {})),
  };
  assert_eq!(
    esbuild_args(&options),
    vec![
      "./views/info/index.tsx",
      "--bundle",
      "--sourcemap=inline",
      "--platform=browser",
      "--outdir=out",
      "--outbase=.",
      "--watch=forever",
      "--log-level=info",
      "--color=false",
    ]
  );
}

#[test]
fn test_named_entry_uses_esbuild_alias_syntax() {
  let mut options = host(None, false);
  options.input = vec![InputItem { name: Some("extension".into()), import: "./src/client.ts".into() }];
  assert_eq!(esbuild_args(&options)[0], "extension=./src/client.ts");
}
