use extbuild_error::BuildDiagnostic;

use crate::OutputAsset;

/// Warnings have the same shape as errors, they just don't fail the build.
pub type BuildWarning = BuildDiagnostic;

#[derive(Debug, Default, Clone)]
pub struct BuildOutput {
  pub warnings: Vec<BuildWarning>,
  pub assets: Vec<OutputAsset>,
}
