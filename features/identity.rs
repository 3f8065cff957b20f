use itertools::izip;
use ndarray::prelude::*;

/// An `IdentityFeatureGroup` passes a single number column from the input dataframe through to the output features untouched. Variables that have no interval breakpoints use this group.
#[derive(Clone, Debug)]
pub struct IdentityFeatureGroup {
	pub source_column_name: String,
}

impl IdentityFeatureGroup {
	pub fn compute_array_f32(
		&self,
		mut features: ArrayViewMut2<f32>,
		values: &[f32],
		progress: &impl Fn(),
	) {
		for (feature, value) in izip!(features.column_mut(0), values.iter()) {
			*feature = *value;
			progress();
		}
	}
}
