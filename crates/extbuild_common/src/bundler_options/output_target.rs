use std::path::{Path, PathBuf};

use sugar_path::SugarPath;

use crate::InputItem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget {
  /// Everything is bundled into one file.
  File(PathBuf),
  /// One output per entry, placed under `dir` at the entry's path relative to `base`.
  Dir { dir: PathBuf, base: PathBuf },
}

impl OutputTarget {
  /// The bundle path the bundler writes for `input`.
  pub fn bundle_path(&self, input: &InputItem) -> PathBuf {
    match self {
      Self::File(file) => file.clone(),
      Self::Dir { dir, base } => match &input.name {
        Some(name) => dir.join(name).with_extension("js"),
        None => dir.join(Path::new(&input.import).relative(base)).with_extension("js"),
      },
    }
  }
}

#[test]
fn test_dir_output_mirrors_entry_path() {
  let target = OutputTarget::Dir { dir: PathBuf::from("out"), base: PathBuf::from(".") };
  assert_eq!(
    target.bundle_path(&InputItem::from("./views/info/index.tsx")),
    Path::new("out").join("views").join("info").join("index.js")
  );

  let named = InputItem { name: Some("info".to_string()), import: "./views/info/index.tsx".into() };
  assert_eq!(target.bundle_path(&named), Path::new("out").join("info.js"));
}

#[test]
fn test_file_output_ignores_entry() {
  let target = OutputTarget::File(PathBuf::from("out/src/client.js"));
  assert_eq!(target.bundle_path(&InputItem::from("./src/client.ts")), Path::new("out/src/client.js"));
}
