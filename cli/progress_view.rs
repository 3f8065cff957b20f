use colored::Colorize;
use subscale_core::Progress;

/// Prints one dimmed line per pipeline phase. Repeated updates within the same phase are not reprinted, so callbacks can fire per epoch without flooding the terminal.
pub struct ProgressView {
	last_message: Option<String>,
}

impl ProgressView {
	pub fn new() -> ProgressView {
		ProgressView { last_message: None }
	}

	pub fn update(&mut self, progress: Progress) {
		let message = match progress {
			Progress::Loading(_) => "loading the dataset".to_owned(),
			Progress::Shuffling => "shuffling".to_owned(),
			Progress::ComputingFeatures(_) => "computing features".to_owned(),
			Progress::Training(variant, _) => format!("training {}", variant),
			Progress::Testing(variant) => format!("testing {}", variant),
		};
		if self.last_message.as_deref() != Some(message.as_str()) {
			eprintln!("{}", message.dimmed());
			self.last_message = Some(message);
		}
	}
}
