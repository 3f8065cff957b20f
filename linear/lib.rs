/*!
This crate is an implementation of binary logistic regression trained with mini-batch gradient descent. It is used both as a model in its own right and as the continuous initialization for the integer risk score models.

Training is single threaded and therefore deterministic: running the pipeline twice with the same shuffle seed produces bit-identical models, which the architecture comparison relies on.
*/

use num_traits::ToPrimitive;

mod binary_classifier;
mod early_stopping;

pub use self::binary_classifier::BinaryClassifier;

use ndarray::prelude::*;

/// These are the options passed to [`BinaryClassifier::train`](struct.BinaryClassifier.html#method.train).
#[derive(Clone, Debug)]
pub struct TrainOptions {
	/// Specify options for early stopping. If the value is `Some`, early stopping will be enabled. If it is `None`, early stopping will be disabled.
	pub early_stopping_options: Option<EarlyStoppingOptions>,
	/// This is the L2 regularization value to use when updating the model parameters.
	pub l2_regularization: f32,
	/// This is the learning rate to use when updating the model parameters.
	pub learning_rate: f32,
	/// This is the maximum number of epochs to train.
	pub max_epochs: usize,
	/// This is the number of examples to use for each batch of training.
	pub n_examples_per_batch: usize,
}

impl Default for TrainOptions {
	fn default() -> TrainOptions {
		TrainOptions {
			early_stopping_options: Some(EarlyStoppingOptions {
				early_stopping_fraction: 0.1,
				n_epochs_without_improvement_to_stop: 3,
				min_decrease_in_loss_for_significant_change: 1e-3,
			}),
			l2_regularization: 0.0,
			learning_rate: 0.1,
			max_epochs: 100,
			n_examples_per_batch: 128,
		}
	}
}

/// The parameters in this struct control how to determine whether training should stop early after each epoch.
#[derive(Clone, Debug)]
pub struct EarlyStoppingOptions {
	/// This is the fraction of the dataset that is set aside to compute the early stopping metric.
	pub early_stopping_fraction: f32,
	/// If this many epochs pass by without a significant improvement in the early stopping metric over the previous epoch, training will be stopped early.
	pub n_epochs_without_improvement_to_stop: usize,
	/// This is the minimum decrease in the early stopping metric for an epoch to be considered a significant improvement over the previous epoch.
	pub min_decrease_in_loss_for_significant_change: f32,
}

/// This function splits the `features` and `labels` arrays into training and early stopping arrays, where the size of the early stopping array will be `features.len() * early_stopping_fraction`.
fn train_early_stopping_split<'features, 'labels>(
	features: ArrayView2<'features, f32>,
	labels: ArrayView1<'labels, usize>,
	early_stopping_fraction: f32,
) -> (
	ArrayView2<'features, f32>,
	ArrayView1<'labels, usize>,
	ArrayView2<'features, f32>,
	ArrayView1<'labels, usize>,
) {
	let split_index = ((1.0 - early_stopping_fraction) * features.nrows().to_f32().unwrap())
		.to_usize()
		.unwrap();
	let (features_train, features_early_stopping) = features.split_at(Axis(0), split_index);
	let (labels_train, labels_early_stopping) = labels.split_at(Axis(0), split_index);
	(
		features_train,
		labels_train,
		features_early_stopping,
		labels_early_stopping,
	)
}
