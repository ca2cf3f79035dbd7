use std::{
  fmt::Display,
  ops::{Deref, DerefMut},
};

/// Where the bundler located a diagnostic. `line` is 1-based, `column` is 0-based,
/// both as the bundler reports them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
  pub file: String,
  pub line: u32,
  pub column: u32,
}

impl Display for Location {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "{}:{}:{}", self.file, self.line, self.column)
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildDiagnostic {
  pub text: String,
  pub location: Option<Location>,
}

impl BuildDiagnostic {
  pub fn new(text: impl Into<String>) -> Self {
    Self { text: text.into(), location: None }
  }

  #[must_use]
  pub fn with_location(mut self, location: Location) -> Self {
    self.location = Some(location);
    self
  }
}

impl Display for BuildDiagnostic {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match &self.location {
      Some(location) => write!(f, "{location}: error: {}", self.text),
      None => write!(f, "error: {}", self.text),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildError(pub Vec<BuildDiagnostic>);

impl BuildError {
  pub fn errors(&self) -> &[BuildDiagnostic] {
    &self.0
  }
}

impl Deref for BuildError {
  type Target = Vec<BuildDiagnostic>;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl DerefMut for BuildError {
  fn deref_mut(&mut self) -> &mut Self::Target {
    &mut self.0
  }
}

impl Display for BuildError {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self.0.len() {
      1 => write!(f, "build failed with 1 error"),
      n => write!(f, "build failed with {n} errors"),
    }
  }
}

impl std::error::Error for BuildError {}

impl From<BuildDiagnostic> for BuildError {
  fn from(diagnostic: BuildDiagnostic) -> Self {
    Self(vec![diagnostic])
  }
}

impl From<Vec<BuildDiagnostic>> for BuildError {
  fn from(diagnostics: Vec<BuildDiagnostic>) -> Self {
    Self(diagnostics)
  }
}

impl From<anyhow::Error> for BuildError {
  fn from(error: anyhow::Error) -> Self {
    Self(vec![BuildDiagnostic::new(format!("{error:#}"))])
  }
}

pub type BuildResult<T> = anyhow::Result<T, BuildError>;

#[test]
fn test_diagnostic_display() {
  let diagnostic = BuildDiagnostic::new("bad").with_location(Location {
    file: "a.ts".to_string(),
    line: 1,
    column: 2,
  });
  assert_eq!(diagnostic.to_string(), "a.ts:1:2: error: bad");
  assert_eq!(BuildDiagnostic::new("no input files").to_string(), "error: no input files");
}

#[test]
fn test_from_anyhow_keeps_context_chain() {
  use anyhow::Context;

  let error: anyhow::Result<()> =
    Err(anyhow::anyhow!("No such file or directory")).context("failed to spawn esbuild");
  let error = BuildError::from(error.unwrap_err());
  assert_eq!(error.len(), 1);
  assert_eq!(error[0].text, "failed to spawn esbuild: No such file or directory");
  assert!(error[0].location.is_none());
}
