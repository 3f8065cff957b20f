use std::sync::{
	atomic::{AtomicU64, Ordering},
	Arc,
};

/// A `ProgressCounter` is shared between the pipeline and whoever is displaying progress. The pipeline calls `inc` as it works and the displayer reads the current value with `get`.
#[derive(Clone, Debug)]
pub struct ProgressCounter {
	current: Arc<AtomicU64>,
	total: u64,
}

impl ProgressCounter {
	pub fn new(total: u64) -> ProgressCounter {
		ProgressCounter {
			current: Arc::new(AtomicU64::new(0)),
			total,
		}
	}

	pub fn total(&self) -> u64 {
		self.total
	}

	pub fn get(&self) -> u64 {
		self.current.load(Ordering::Relaxed)
	}

	pub fn set(&self, value: u64) {
		self.current.store(value, Ordering::Relaxed);
	}

	pub fn inc(&self, amount: u64) {
		self.current.fetch_add(amount, Ordering::Relaxed);
	}

	/// Return the completed fraction in `[0, 1]`, or 1 if the total is zero.
	pub fn fraction(&self) -> f32 {
		if self.total == 0 {
			1.0
		} else {
			self.get() as f32 / self.total as f32
		}
	}
}
