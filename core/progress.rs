use crate::config::Variant;
use subscale_util::progress_counter::ProgressCounter;

#[derive(Debug)]
pub enum Progress {
	Loading(ProgressCounter),
	Shuffling,
	ComputingFeatures(ProgressCounter),
	Training(Variant, ProgressCounter),
	Testing(Variant),
}
