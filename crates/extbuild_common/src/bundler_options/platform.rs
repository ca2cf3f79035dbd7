use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
  /// The extension host runs inside the editor's Node process.
  Node,
  /// Webviews are plain web documents.
  Browser,
}

impl Display for Platform {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Node => write!(f, "node"),
      Self::Browser => write!(f, "browser"),
    }
  }
}
