/*!
This crate defines the [`StreamingMetric`](trait.StreamingMetric.html) trait and the concrete metrics used to train and compare the risk scoring models: [`Mean`](struct.Mean.html), [`BinaryCrossEntropy`](struct.BinaryCrossEntropy.html), [`BinaryClassificationMetrics`](struct.BinaryClassificationMetrics.html), and the ROC curve / AUC functions.
*/

mod auc_roc;
mod binary_classification;
mod binary_cross_entropy;
mod mean;

pub use self::auc_roc::{auc_roc, compute_roc_curve, RocCurvePoint};
pub use self::binary_classification::{
	BinaryClassificationMetrics, BinaryClassificationMetricsInput,
	BinaryClassificationMetricsOutput,
};
pub use self::binary_cross_entropy::{BinaryCrossEntropy, BinaryCrossEntropyInput};
pub use self::mean::Mean;

/**
The `StreamingMetric` trait defines a common interface to metrics that can be computed in a streaming manner, where the input is available in chunks.

After being initialized, a value of a type implementing `StreamingMetric` can have `update()` called on it with values of the associated type `Input`. Multiple values can be merged together by calling `merge()`, which is useful when computing a metric across multiple threads. When finished aggregating, call `finalize()` to produce the associated type `Output`.

The seemingly unused generic lifetime `'a` exists here to allow `Input`s and `Output`s to borrow from their enclosing scope.
*/
pub trait StreamingMetric<'a> {
	/// `Input` is the type to aggregate in calls to `update()`.
	type Input;
	/// `Output` is the return type of `finalize()`.
	type Output;
	/// Update this streaming metric with the `Input` `input`.
	fn update(&mut self, input: Self::Input);
	/// Merge multiple independently computed streaming metrics.
	fn merge(&mut self, other: Self);
	/// When you are done aggregating `Input`s, call `finalize()` to produce an `Output`.
	fn finalize(self) -> Self::Output;
}
