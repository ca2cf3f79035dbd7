pub mod build_output;
pub mod output_asset;
