/*!
This crate orchestrates the architecture comparison: it loads the dataset, the breakpoints, and the config, builds the one-hot subscale features, runs each selected model architecture over one shared train/test split, and produces the metrics report.
*/

pub mod binning;
pub mod compare;
pub mod config;
pub mod progress;
pub mod report;

pub use self::binning::BinningSpec;
pub use self::compare::{
	compare, compare_dataframe, CompareOutput, PreprocessSummary, SubscaleSummary, VariantOutput,
};
pub use self::config::{Config, Variant};
pub use self::progress::Progress;
pub use self::report::{write_report, Report};
