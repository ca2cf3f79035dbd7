mod bundler_options;
mod types;

pub use bundler_options::{
  BuildOptions,
  input_item::InputItem,
  output_format::OutputFormat,
  output_target::OutputTarget,
  platform::Platform,
  source_map_type::SourceMapType,
  watch_option::{WatchHandler, WatchOption},
};

pub use crate::types::{
  build_output::{BuildOutput, BuildWarning},
  output_asset::{AssetKind, OutputAsset},
};
