use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssetKind {
  Chunk,
  SourceMap,
  Stylesheet,
}

impl AssetKind {
  pub fn from_path(path: &Path) -> Self {
    match path.extension().and_then(|ext| ext.to_str()) {
      Some("map") => Self::SourceMap,
      Some("css") => Self::Stylesheet,
      _ => Self::Chunk,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Chunk => "chunk",
      Self::SourceMap => "map",
      Self::Stylesheet => "css",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputAsset {
  pub filename: String,
  pub kind: AssetKind,
  pub size: u64,
}

#[test]
fn test_asset_kind_from_path() {
  assert_eq!(AssetKind::from_path(Path::new("out/src/client.js")), AssetKind::Chunk);
  assert_eq!(AssetKind::from_path(Path::new("out/src/client.js.map")), AssetKind::SourceMap);
  assert_eq!(AssetKind::from_path(Path::new("out/views/info/index.css")), AssetKind::Stylesheet);
}
