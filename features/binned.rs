use crate::interval::Interval;
use ndarray::prelude::*;

/**
A `BinnedFeatureGroup` creates one number feature per interval of a binned variable. For each example, the feature for the interval containing the variable's value is 1.0 and every other feature is 0.0. A value that falls in no interval, such as `NaN`, produces an all-zero row for this group.

# Example

For the intervals `(-INF, 63.0]`, `(63.0, 71.0]`, `(71.0, +INF)`:

| dataframe value | feature values |
|-----------------|----------------|
| 58.0            | [1, 0, 0]      |
| 63.5            | [0, 1, 0]      |
| 80.0            | [0, 0, 1]      |
*/
#[derive(Clone, Debug)]
pub struct BinnedFeatureGroup {
	pub source_column_name: String,
	pub intervals: Vec<Interval>,
}

impl BinnedFeatureGroup {
	/// The feature names are the source column name suffixed with the 1-based interval index, `var_1 .. var_k`.
	pub fn feature_names(&self) -> Vec<String> {
		(1..=self.intervals.len())
			.map(|index| format!("{}_{}", self.source_column_name, index))
			.collect()
	}

	pub fn compute_array_f32(
		&self,
		mut features: ArrayViewMut2<f32>,
		values: &[f32],
		progress: &impl Fn(),
	) {
		features.fill(0.0);
		for (mut features, value) in features.axis_iter_mut(Axis(0)).zip(values.iter()) {
			if let Some(interval_index) = self
				.intervals
				.iter()
				.position(|interval| interval.contains(*value))
			{
				features[interval_index] = 1.0;
			}
			progress();
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_compute() {
		let feature_group = BinnedFeatureGroup {
			source_column_name: "estimate".to_owned(),
			intervals: vec![
				Interval::parse("(-INF, 63.0]").unwrap(),
				Interval::parse("(63.0, 71.0]").unwrap(),
				Interval::parse("(71.0, +INF)").unwrap(),
			],
		};
		assert_eq!(
			feature_group.feature_names(),
			vec!["estimate_1", "estimate_2", "estimate_3"]
		);
		let values = vec![58.0, 63.0, 63.5, 80.0, std::f32::NAN];
		let mut features = Array::zeros((values.len(), 3));
		feature_group.compute_array_f32(features.view_mut(), &values, &|| {});
		assert_eq!(
			features,
			ndarray::arr2(&[
				[1.0, 0.0, 0.0],
				[1.0, 0.0, 0.0],
				[0.0, 1.0, 0.0],
				[0.0, 0.0, 1.0],
				[0.0, 0.0, 0.0],
			])
		);
	}
}
