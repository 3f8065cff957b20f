use super::StreamingMetric;
use itertools::izip;
use num_traits::ToPrimitive;

/**
`BinaryClassificationMetrics` accumulates the confusion counts of a binary classifier at a fixed classification threshold and produces the accuracy, precision, recall, and F1 score.

Labels are 1-based class ids, where 1 is the negative class and 2 is the positive class. A prediction counts as positive when its probability is greater than or equal to the threshold.
*/
pub struct BinaryClassificationMetrics {
	threshold: f32,
	true_positives: u64,
	false_positives: u64,
	true_negatives: u64,
	false_negatives: u64,
}

/// The input to [BinaryClassificationMetrics](struct.BinaryClassificationMetrics.html).
pub struct BinaryClassificationMetricsInput<'a> {
	pub probabilities: &'a [f32],
	pub labels: &'a [usize],
}

/// The output of [BinaryClassificationMetrics](struct.BinaryClassificationMetrics.html).
#[derive(Clone, Debug)]
pub struct BinaryClassificationMetricsOutput {
	pub threshold: f32,
	pub true_positives: u64,
	pub false_positives: u64,
	pub true_negatives: u64,
	pub false_negatives: u64,
	pub accuracy: f32,
	pub precision: f32,
	pub recall: f32,
	pub f1_score: f32,
}

impl BinaryClassificationMetrics {
	pub fn new(threshold: f32) -> BinaryClassificationMetrics {
		BinaryClassificationMetrics {
			threshold,
			true_positives: 0,
			false_positives: 0,
			true_negatives: 0,
			false_negatives: 0,
		}
	}
}

impl Default for BinaryClassificationMetrics {
	fn default() -> BinaryClassificationMetrics {
		BinaryClassificationMetrics::new(0.5)
	}
}

impl<'a> StreamingMetric<'a> for BinaryClassificationMetrics {
	type Input = BinaryClassificationMetricsInput<'a>;
	type Output = BinaryClassificationMetricsOutput;

	fn update(&mut self, input: BinaryClassificationMetricsInput) {
		for (probability, label) in izip!(input.probabilities.iter(), input.labels.iter()) {
			let predicted_positive = *probability >= self.threshold;
			let actual_positive = match label {
				1 => false,
				2 => true,
				_ => unreachable!(),
			};
			match (predicted_positive, actual_positive) {
				(true, true) => self.true_positives += 1,
				(true, false) => self.false_positives += 1,
				(false, true) => self.false_negatives += 1,
				(false, false) => self.true_negatives += 1,
			}
		}
	}

	fn merge(&mut self, other: Self) {
		self.true_positives += other.true_positives;
		self.false_positives += other.false_positives;
		self.true_negatives += other.true_negatives;
		self.false_negatives += other.false_negatives;
	}

	fn finalize(self) -> BinaryClassificationMetricsOutput {
		let n_examples =
			self.true_positives + self.false_positives + self.true_negatives + self.false_negatives;
		let accuracy = (self.true_positives + self.true_negatives).to_f32().unwrap()
			/ n_examples.to_f32().unwrap();
		let precision = self.true_positives.to_f32().unwrap()
			/ (self.true_positives + self.false_positives).to_f32().unwrap();
		let recall = self.true_positives.to_f32().unwrap()
			/ (self.true_positives + self.false_negatives).to_f32().unwrap();
		let f1_score = 2.0 * (precision * recall) / (precision + recall);
		BinaryClassificationMetricsOutput {
			threshold: self.threshold,
			true_positives: self.true_positives,
			false_positives: self.false_positives,
			true_negatives: self.true_negatives,
			false_negatives: self.false_negatives,
			accuracy,
			precision,
			recall,
			f1_score,
		}
	}
}

#[test]
fn test_binary_classification_metrics() {
	let mut metrics = BinaryClassificationMetrics::default();
	let probabilities = [0.9, 0.8, 0.7, 0.4, 0.6, 0.2, 0.3, 0.1];
	let labels = [2, 2, 2, 2, 1, 1, 1, 1];
	metrics.update(BinaryClassificationMetricsInput {
		probabilities: &probabilities,
		labels: &labels,
	});
	let metrics = metrics.finalize();
	assert_eq!(metrics.true_positives, 3);
	assert_eq!(metrics.false_positives, 1);
	assert_eq!(metrics.true_negatives, 3);
	assert_eq!(metrics.false_negatives, 1);
	assert_eq!(metrics.accuracy, 0.75);
	assert_eq!(metrics.precision, 0.75);
	assert_eq!(metrics.recall, 0.75);
	assert_eq!(metrics.f1_score, 0.75);
}

#[test]
fn test_binary_classification_metrics_merge() {
	let mut left = BinaryClassificationMetrics::default();
	left.update(BinaryClassificationMetricsInput {
		probabilities: &[0.9, 0.1],
		labels: &[2, 1],
	});
	let mut right = BinaryClassificationMetrics::default();
	right.update(BinaryClassificationMetricsInput {
		probabilities: &[0.2, 0.8],
		labels: &[2, 1],
	});
	left.merge(right);
	let metrics = left.finalize();
	assert_eq!(metrics.true_positives, 1);
	assert_eq!(metrics.false_positives, 1);
	assert_eq!(metrics.true_negatives, 1);
	assert_eq!(metrics.false_negatives, 1);
	assert_eq!(metrics.accuracy, 0.5);
}
