/*!
This crate turns dataframe columns into the feature matrices consumed by the models. A variable with interval breakpoints becomes a block of one-hot features, one per interval; a variable without breakpoints passes through unchanged. Feature groups are assembled per subscale, so each subscale's classifier sees only its own variables' features.
*/

use anyhow::{format_err, Result};
use ndarray::prelude::*;
use subscale_dataframe::{ColumnView, DataFrameView};

mod binned;
mod identity;
pub mod interval;

pub use self::binned::BinnedFeatureGroup;
pub use self::identity::IdentityFeatureGroup;
pub use self::interval::Interval;

/// This enum describes how to transform one column from the input dataframe to one or more columns in the output features.
#[derive(Clone, Debug)]
pub enum FeatureGroup {
	Binned(BinnedFeatureGroup),
	Identity(IdentityFeatureGroup),
}

impl FeatureGroup {
	pub fn source_column_name(&self) -> &str {
		match self {
			FeatureGroup::Binned(feature_group) => &feature_group.source_column_name,
			FeatureGroup::Identity(feature_group) => &feature_group.source_column_name,
		}
	}

	/// Return the number of features this feature group will produce.
	pub fn n_features(&self) -> usize {
		match self {
			FeatureGroup::Binned(feature_group) => feature_group.intervals.len(),
			FeatureGroup::Identity(_) => 1,
		}
	}

	pub fn feature_names(&self) -> Vec<String> {
		match self {
			FeatureGroup::Binned(feature_group) => feature_group.feature_names(),
			FeatureGroup::Identity(feature_group) => {
				vec![feature_group.source_column_name.clone()]
			}
		}
	}
}

/// Return the names of all the features the feature groups will produce, in order.
pub fn feature_names(feature_groups: &[FeatureGroup]) -> Vec<String> {
	feature_groups
		.iter()
		.flat_map(|feature_group| feature_group.feature_names())
		.collect()
}

/// Compute the feature matrix for `dataframe` described by `feature_groups`, one group's features after another.
pub fn compute_features(
	dataframe: &DataFrameView,
	feature_groups: &[FeatureGroup],
	progress: &impl Fn(),
) -> Result<Array2<f32>> {
	let n_features = feature_groups
		.iter()
		.map(|feature_group| feature_group.n_features())
		.sum::<usize>();
	let mut features = Array::zeros((dataframe.nrows(), n_features));
	let mut feature_index = 0;
	for feature_group in feature_groups.iter() {
		let n_features_in_group = feature_group.n_features();
		let slice = s![.., feature_index..feature_index + n_features_in_group];
		let values = column_values(dataframe, feature_group.source_column_name())?;
		match feature_group {
			FeatureGroup::Binned(feature_group) => {
				feature_group.compute_array_f32(features.slice_mut(slice), values, progress)
			}
			FeatureGroup::Identity(feature_group) => {
				feature_group.compute_array_f32(features.slice_mut(slice), values, progress)
			}
		}
		feature_index += n_features_in_group;
	}
	Ok(features)
}

fn column_values<'a>(dataframe: &'a DataFrameView, column_name: &str) -> Result<&'a [f32]> {
	let column = dataframe
		.column(column_name)
		.ok_or_else(|| format_err!("did not find variable \"{}\" in the dataset", column_name))?;
	match column {
		ColumnView::Number(column) => Ok(column.data),
		_ => Err(format_err!(
			"variable \"{}\" must be a number column",
			column_name
		)),
	}
}

#[cfg(test)]
mod test {
	use super::*;
	use subscale_dataframe::{Column, DataFrame, NumberColumn};

	fn test_dataframe() -> DataFrame {
		DataFrame {
			columns: vec![
				Column::Number(NumberColumn {
					name: "estimate".to_owned(),
					data: vec![58.0, 63.5, 80.0],
				}),
				Column::Number(NumberColumn {
					name: "trades".to_owned(),
					data: vec![1.0, 2.0, 3.0],
				}),
			],
		}
	}

	#[test]
	fn test_compute_features() {
		let dataframe = test_dataframe();
		let feature_groups = vec![
			FeatureGroup::Binned(BinnedFeatureGroup {
				source_column_name: "estimate".to_owned(),
				intervals: vec![
					Interval::parse("(-INF, 63.0]").unwrap(),
					Interval::parse("(63.0, 71.0]").unwrap(),
					Interval::parse("(71.0, +INF)").unwrap(),
				],
			}),
			FeatureGroup::Identity(IdentityFeatureGroup {
				source_column_name: "trades".to_owned(),
			}),
		];
		assert_eq!(
			feature_names(&feature_groups),
			vec!["estimate_1", "estimate_2", "estimate_3", "trades"]
		);
		let features = compute_features(&dataframe.view(), &feature_groups, &|| {}).unwrap();
		assert_eq!(
			features,
			ndarray::arr2(&[
				[1.0, 0.0, 0.0, 1.0],
				[0.0, 1.0, 0.0, 2.0],
				[0.0, 0.0, 1.0, 3.0],
			])
		);
	}

	#[test]
	fn test_compute_features_missing_variable() {
		let dataframe = test_dataframe();
		let feature_groups = vec![FeatureGroup::Identity(IdentityFeatureGroup {
			source_column_name: "missing".to_owned(),
		})];
		let error = compute_features(&dataframe.view(), &feature_groups, &|| {}).unwrap_err();
		assert!(error.to_string().contains("missing"));
	}
}
