use super::early_stopping::EarlyStoppingMonitor;
use super::{train_early_stopping_split, TrainOptions};
use itertools::izip;
use ndarray::prelude::*;
use std::ops::Neg;
use subscale_metrics::{
	BinaryCrossEntropy, BinaryCrossEntropyInput, Mean, StreamingMetric,
};

/// A binary logistic regression model. Labels are 1-based class ids, where 1 is the negative class and 2 is the positive class.
#[derive(Clone, Debug, PartialEq)]
pub struct BinaryClassifier {
	pub weights: Array1<f32>,
	pub bias: f32,
	/// the mean training loss for each epoch
	pub losses: Vec<f32>,
}

impl BinaryClassifier {
	pub fn train(
		features: ArrayView2<f32>,
		labels: ArrayView1<usize>,
		options: &TrainOptions,
		progress: &impl Fn(),
	) -> BinaryClassifier {
		let n_features = features.ncols();
		let early_stopping_fraction = options
			.early_stopping_options
			.as_ref()
			.map(|early_stopping_options| early_stopping_options.early_stopping_fraction)
			.unwrap_or(0.0);
		let (features_train, labels_train, features_early_stopping, labels_early_stopping) =
			train_early_stopping_split(features, labels, early_stopping_fraction);
		let mut model = BinaryClassifier {
			weights: Array1::zeros(n_features),
			bias: 0.0,
			losses: Vec::new(),
		};
		let mut early_stopping_monitor =
			options
				.early_stopping_options
				.as_ref()
				.map(|early_stopping_options| {
					EarlyStoppingMonitor::new(
						early_stopping_options.min_decrease_in_loss_for_significant_change,
						early_stopping_options.n_epochs_without_improvement_to_stop,
					)
				});
		for _ in 0..options.max_epochs {
			let mut epoch_loss = Mean::default();
			for (features, labels) in izip!(
				features_train.axis_chunks_iter(Axis(0), options.n_examples_per_batch),
				labels_train.axis_chunks_iter(Axis(0), options.n_examples_per_batch),
			) {
				let batch_loss = model.train_batch(features, labels, options);
				epoch_loss.update(batch_loss);
			}
			model.losses.push(epoch_loss.finalize().unwrap_or(0.0));
			progress();
			if let Some(early_stopping_monitor) = early_stopping_monitor.as_mut() {
				let early_stopping_metric_value = model.compute_early_stopping_metric_value(
					features_early_stopping,
					labels_early_stopping,
					options,
				);
				if early_stopping_monitor.update(early_stopping_metric_value) {
					break;
				}
			}
		}
		model
	}

	/// Update the model parameters with one batch of examples and return the batch's mean loss.
	fn train_batch(
		&mut self,
		features: ArrayView2<f32>,
		labels: ArrayView1<usize>,
		options: &TrainOptions,
	) -> f32 {
		let logits = features.dot(&self.weights) + self.bias;
		let mut predictions = logits.mapv_into(|logit| 1.0 / (logit.neg().exp() + 1.0));
		let mut batch_loss = BinaryCrossEntropy::default();
		for (prediction, label) in izip!(predictions.iter(), labels.iter()) {
			batch_loss.update(BinaryCrossEntropyInput {
				probability: *prediction,
				label: *label,
			});
		}
		izip!(predictions.view_mut(), labels).for_each(|(prediction, label)| {
			let label = match label {
				1 => 0.0,
				2 => 1.0,
				_ => unreachable!(),
			};
			*prediction -= label;
		});
		let py = predictions.insert_axis(Axis(1));
		let weight_gradients = (&features * &py).mean_axis(Axis(0)).unwrap();
		let bias_gradient = py.mean_axis(Axis(0)).unwrap()[0];
		izip!(self.weights.view_mut(), weight_gradients.view()).for_each(
			|(weight, weight_gradient)| {
				let weight_gradient = weight_gradient + options.l2_regularization * *weight;
				*weight += -options.learning_rate * weight_gradient;
			},
		);
		self.bias += -options.learning_rate * bias_gradient;
		batch_loss.finalize().unwrap_or(0.0)
	}

	fn compute_early_stopping_metric_value(
		&self,
		features: ArrayView2<f32>,
		labels: ArrayView1<usize>,
		options: &TrainOptions,
	) -> f32 {
		let mut metric = BinaryCrossEntropy::default();
		let mut predictions = Array::zeros(options.n_examples_per_batch);
		for (features, labels) in izip!(
			features.axis_chunks_iter(Axis(0), options.n_examples_per_batch),
			labels.axis_chunks_iter(Axis(0), options.n_examples_per_batch),
		) {
			let slice = s![0..features.nrows()];
			let mut predictions = predictions.slice_mut(slice);
			self.predict(features, predictions.view_mut());
			for (prediction, label) in izip!(predictions.iter(), labels.iter()) {
				metric.update(BinaryCrossEntropyInput {
					probability: *prediction,
					label: *label,
				});
			}
		}
		metric.finalize().unwrap_or(std::f32::INFINITY)
	}

	/// Write the predicted probabilities of the positive class into `probabilities` for the input `features`.
	pub fn predict(&self, features: ArrayView2<f32>, mut probabilities: ArrayViewMut1<f32>) {
		probabilities.fill(self.bias);
		ndarray::linalg::general_mat_vec_mul(
			1.0,
			&features,
			&self.weights,
			1.0,
			&mut probabilities,
		);
		for probability in probabilities.iter_mut() {
			*probability = 1.0 / (probability.neg().exp() + 1.0);
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_train_separable() {
		// One indicator feature that perfectly predicts the label.
		let features = ndarray::arr2(&[
			[1.0],
			[1.0],
			[1.0],
			[1.0],
			[0.0],
			[0.0],
			[0.0],
			[0.0],
		]);
		let labels = ndarray::arr1(&[2, 2, 2, 2, 1, 1, 1, 1]);
		let options = TrainOptions {
			early_stopping_options: None,
			learning_rate: 0.5,
			max_epochs: 200,
			n_examples_per_batch: 8,
			..Default::default()
		};
		let model = BinaryClassifier::train(features.view(), labels.view(), &options, &|| {});
		let mut probabilities = Array::zeros(features.nrows());
		model.predict(features.view(), probabilities.view_mut());
		for (probability, label) in probabilities.iter().zip(labels.iter()) {
			match label {
				2 => assert!(*probability > 0.5),
				1 => assert!(*probability < 0.5),
				_ => unreachable!(),
			}
		}
		// The training loss decreases.
		assert!(model.losses.first().unwrap() > model.losses.last().unwrap());
	}

	#[test]
	fn test_l2_regularization_shrinks_weights() {
		let features = ndarray::arr2(&[[1.0], [1.0], [0.0], [0.0]]);
		let labels = ndarray::arr1(&[2, 2, 1, 1]);
		let options = TrainOptions {
			early_stopping_options: None,
			learning_rate: 0.5,
			max_epochs: 100,
			n_examples_per_batch: 4,
			..Default::default()
		};
		let unregularized =
			BinaryClassifier::train(features.view(), labels.view(), &options, &|| {});
		let options = TrainOptions {
			l2_regularization: 1.0,
			..options
		};
		let regularized = BinaryClassifier::train(features.view(), labels.view(), &options, &|| {});
		assert!(regularized.weights[0].abs() < unregularized.weights[0].abs());
	}
}
