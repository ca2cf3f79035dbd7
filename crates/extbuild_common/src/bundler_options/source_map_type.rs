use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceMapType {
  /// A companion `.map` file linked from the bundle, what esbuild's `sourcemap: true` means.
  Linked,
  /// The map is embedded as a data url, for outputs served as a single document.
  Inline,
}

impl Display for SourceMapType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Linked => write!(f, "true"),
      Self::Inline => write!(f, "\"inline\""),
    }
  }
}
