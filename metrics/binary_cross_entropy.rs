use super::mean::Mean;
use super::StreamingMetric;
use num_traits::clamp;

/// BinaryCrossEntropy is the loss function used for binary classification. [Learn more](https://en.wikipedia.org/wiki/Cross_entropy#Cross-entropy_loss_function_and_logistic_regression).
#[derive(Debug, Default)]
pub struct BinaryCrossEntropy(Mean);

/// The input to [BinaryCrossEntropy](struct.BinaryCrossEntropy.html). `label` is the 1-based class id, where 1 is the negative class and 2 is the positive class.
pub struct BinaryCrossEntropyInput {
	pub probability: f32,
	pub label: usize,
}

impl StreamingMetric<'_> for BinaryCrossEntropy {
	type Input = BinaryCrossEntropyInput;
	type Output = Option<f32>;

	fn update(&mut self, input: BinaryCrossEntropyInput) {
		let BinaryCrossEntropyInput { probability, label } = input;
		let label = match label {
			1 => 0.0,
			2 => 1.0,
			_ => unreachable!(),
		};
		// Binary cross entropy is undefined when the probability is 0 or 1, so clamp it to (epsilon, 1 - epsilon).
		let probability_clamped = clamp(probability, std::f32::EPSILON, 1.0 - std::f32::EPSILON);
		let binary_cross_entropy = -1.0 * label * probability_clamped.ln()
			+ -1.0 * (1.0 - label) * (1.0 - probability_clamped).ln();
		self.0.update(binary_cross_entropy);
	}

	fn merge(&mut self, other: Self) {
		self.0.merge(other.0)
	}

	fn finalize(self) -> Option<f32> {
		self.0.finalize()
	}
}

#[test]
fn test_binary_cross_entropy() {
	let mut metric = BinaryCrossEntropy::default();
	metric.update(BinaryCrossEntropyInput {
		probability: 0.5,
		label: 2,
	});
	metric.update(BinaryCrossEntropyInput {
		probability: 0.5,
		label: 1,
	});
	let loss = metric.finalize().unwrap();
	assert!(f32::abs(loss - 2.0f32.ln()) < 1e-6);
}
