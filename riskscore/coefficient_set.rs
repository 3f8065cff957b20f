use anyhow::{format_err, Context, Result};
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use std::path::Path;

/**
A `CoefficientSet` holds the integer box constraints for a risk score model: one `[lower, upper]` range per variable plus a range for the intercept.

Every variable starts with the symmetric default range `[-max_coefficient, max_coefficient]`. Individual variables can be tightened from a bounds csv with `variable_name,lb,ub` rows.
*/
#[derive(Clone, Debug)]
pub struct CoefficientSet {
	pub variable_names: Vec<String>,
	pub lower_bounds: Vec<i32>,
	pub upper_bounds: Vec<i32>,
	pub intercept_lower_bound: i32,
	pub intercept_upper_bound: i32,
}

#[derive(Debug, serde::Deserialize)]
struct BoundsRow {
	variable_name: String,
	lb: i32,
	ub: i32,
}

impl CoefficientSet {
	pub fn new(variable_names: Vec<String>, max_coefficient: i32) -> CoefficientSet {
		let n_variables = variable_names.len();
		CoefficientSet {
			variable_names,
			lower_bounds: vec![-max_coefficient; n_variables],
			upper_bounds: vec![max_coefficient; n_variables],
			intercept_lower_bound: -max_coefficient,
			intercept_upper_bound: max_coefficient,
		}
	}

	/// Tighten individual variables' ranges from a bounds csv with `variable_name,lb,ub` rows. Rows naming variables that are not in this set are ignored, so one bounds file can serve every subscale.
	pub fn apply_bounds_csv(&mut self, path: &Path) -> Result<()> {
		let mut reader = csv::Reader::from_path(path)
			.with_context(|| format!("failed to read bounds file {}", path.display()))?;
		for row in reader.deserialize() {
			let row: BoundsRow = row
				.with_context(|| format!("invalid row in bounds file {}", path.display()))?;
			if row.lb > row.ub {
				return Err(format_err!(
					"bounds for variable \"{}\" are empty: lb {} > ub {}",
					row.variable_name,
					row.lb,
					row.ub
				));
			}
			if let Some(index) = self
				.variable_names
				.iter()
				.position(|variable_name| *variable_name == row.variable_name)
			{
				self.lower_bounds[index] = row.lb;
				self.upper_bounds[index] = row.ub;
			}
		}
		Ok(())
	}

	/**
	Set the intercept range so the intercept can counteract any score the coefficient ranges can produce on this dataset, capped at `max_offset`.

	The extreme achievable score is computed per column from the column's value range and the coefficient range, so for one-hot features the cap is simply the sum of the largest absolute bounds.
	*/
	pub fn update_intercept_bounds(&mut self, features: ArrayView2<f32>, max_offset: i32) {
		let mut score_min = 0.0f32;
		let mut score_max = 0.0f32;
		for (column, (lower, upper)) in features.gencolumns().into_iter().zip(
			self.lower_bounds
				.iter()
				.zip(self.upper_bounds.iter()),
		) {
			let column_min = column.iter().copied().fold(std::f32::INFINITY, f32::min);
			let column_max = column
				.iter()
				.copied()
				.fold(std::f32::NEG_INFINITY, f32::max);
			let corners = [
				*lower as f32 * column_min,
				*lower as f32 * column_max,
				*upper as f32 * column_min,
				*upper as f32 * column_max,
			];
			score_min += corners.iter().copied().fold(std::f32::INFINITY, f32::min);
			score_max += corners
				.iter()
				.copied()
				.fold(std::f32::NEG_INFINITY, f32::max);
		}
		let offset = f32::max(score_min.abs(), score_max.abs())
			.ceil()
			.to_i32()
			.unwrap_or(max_offset)
			.min(max_offset);
		self.intercept_lower_bound = -offset;
		self.intercept_upper_bound = offset;
	}

	pub fn n_variables(&self) -> usize {
		self.variable_names.len()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_new() {
		let coefficient_set = CoefficientSet::new(vec!["a".to_owned(), "b".to_owned()], 10);
		assert_eq!(coefficient_set.lower_bounds, vec![-10, -10]);
		assert_eq!(coefficient_set.upper_bounds, vec![10, 10]);
	}

	#[test]
	fn test_update_intercept_bounds() {
		let mut coefficient_set = CoefficientSet::new(vec!["a".to_owned(), "b".to_owned()], 10);
		// Two one-hot columns with coefficients in [-10, 10] can produce scores in [-20, 20].
		let features = ndarray::arr2(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
		coefficient_set.update_intercept_bounds(features.view(), 50);
		assert_eq!(coefficient_set.intercept_lower_bound, -20);
		assert_eq!(coefficient_set.intercept_upper_bound, 20);
		// The cap applies when the achievable scores exceed it.
		coefficient_set.update_intercept_bounds(features.view(), 15);
		assert_eq!(coefficient_set.intercept_lower_bound, -15);
		assert_eq!(coefficient_set.intercept_upper_bound, 15);
	}
}
