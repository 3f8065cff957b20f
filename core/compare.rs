use crate::{
	binning::BinningSpec,
	config::{self, Config, Shuffle, Variant},
	progress::Progress,
};
use anyhow::{format_err, Context, Result};
use itertools::izip;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;
use std::path::Path;
use subscale_dataframe::{Column, DataFrame, DataFrameView, FromCsvOptions};
use subscale_features::{BinnedFeatureGroup, FeatureGroup, IdentityFeatureGroup};
use subscale_linear::BinaryClassifier;
use subscale_metrics::{self as metrics, StreamingMetric};
use subscale_riskscore::{CoefficientSet, FitOptions, RiskScoreModel};
use subscale_util::progress_counter::ProgressCounter;

/// The result of running the comparison: the preprocessing summary and one output per variant, in the order the variants ran.
#[derive(Debug)]
pub struct CompareOutput {
	pub summary: PreprocessSummary,
	pub variants: Vec<VariantOutput>,
}

#[derive(Debug)]
pub struct PreprocessSummary {
	pub n_rows: usize,
	pub n_rows_train: usize,
	pub n_rows_test: usize,
	pub n_variables: usize,
	pub n_binned_variables: usize,
	pub n_unbinned_variables: usize,
	pub subscales: Vec<SubscaleSummary>,
}

#[derive(Debug)]
pub struct SubscaleSummary {
	pub name: String,
	pub variable_names: Vec<String>,
	pub n_features: usize,
}

#[derive(Debug)]
pub struct VariantOutput {
	pub variant: Variant,
	pub metrics: metrics::BinaryClassificationMetricsOutput,
	pub auc_roc: f32,
	pub roc_curve: Vec<metrics::RocCurvePoint>,
	/// A human readable description of the fitted model, such as the risk scorecard or the second layer weights.
	pub model_summary: Option<String>,
}

/// Load the dataset, the config, and the breakpoints from disk and run the comparison.
pub fn compare(
	file_path: &Path,
	target_column_name: &str,
	config_path: Option<&Path>,
	breakpoints_path: &Path,
	bounds_path: Option<&Path>,
	update_progress: &mut dyn FnMut(Progress),
) -> Result<CompareOutput> {
	let config = load_config(config_path)?;
	let binning_spec = BinningSpec::from_path(breakpoints_path)?;
	let dataframe = load_dataframe(file_path, &config, update_progress)?;
	compare_dataframe(
		dataframe,
		target_column_name,
		&config,
		&binning_spec,
		bounds_path,
		update_progress,
	)
}

/// Run the comparison over an already loaded dataframe. Every variant shares one shuffled train/test split, so the metrics are comparable across variants.
pub fn compare_dataframe(
	mut dataframe: DataFrame,
	target_column_name: &str,
	config: &Config,
	binning_spec: &BinningSpec,
	bounds_path: Option<&Path>,
	update_progress: &mut dyn FnMut(Progress),
) -> Result<CompareOutput> {
	if config.subscales.is_empty() {
		return Err(format_err!(
			"the config file must define at least one subscale"
		));
	}

	// Shuffle, then split into train and test.
	shuffle(&mut dataframe, config, update_progress);
	let test_fraction = config.test_fraction.unwrap_or(0.3);
	let n_rows = dataframe.nrows();
	let split_index = ((1.0 - test_fraction) * n_rows.to_f32().unwrap())
		.to_usize()
		.unwrap();
	let (dataframe_train, dataframe_test) = dataframe.view().split_at_row(split_index);

	let labels_train = target_labels(&dataframe_train, target_column_name)?;
	let labels_test = target_labels(&dataframe_test, target_column_name)?;

	// Assemble the feature groups of each subscale and compute its train and test feature matrices.
	let feature_groups: Vec<Vec<FeatureGroup>> = config
		.subscales
		.iter()
		.map(|subscale| subscale_feature_groups(&subscale.variables, binning_spec))
		.collect();
	let n_feature_values = feature_groups
		.iter()
		.map(|feature_groups| feature_groups.len())
		.sum::<usize>()
		* n_rows;
	let progress_counter = ProgressCounter::new(n_feature_values.to_u64().unwrap());
	update_progress(Progress::ComputingFeatures(progress_counter.clone()));
	let subscale_features: Vec<SubscaleFeatures> = izip!(config.subscales.iter(), feature_groups)
		.map(|(subscale, feature_groups)| {
			let features_train =
				subscale_features::compute_features(&dataframe_train, &feature_groups, &|| {
					progress_counter.inc(1)
				})?;
			let features_test =
				subscale_features::compute_features(&dataframe_test, &feature_groups, &|| {
					progress_counter.inc(1)
				})?;
			Ok(SubscaleFeatures {
				name: subscale.name.clone(),
				feature_names: subscale_features::feature_names(&feature_groups),
				features_train,
				features_test,
			})
		})
		.collect::<Result<Vec<_>>>()?;

	// The full one-hot matrix is the subscale blocks side by side.
	let features_train_all = ndarray::concatenate(
		Axis(1),
		&subscale_features
			.iter()
			.map(|subscale| subscale.features_train.view())
			.collect::<Vec<_>>(),
	)?;
	let features_test_all = ndarray::concatenate(
		Axis(1),
		&subscale_features
			.iter()
			.map(|subscale| subscale.features_test.view())
			.collect::<Vec<_>>(),
	)?;
	let feature_names_all: Vec<String> = subscale_features
		.iter()
		.flat_map(|subscale| subscale.feature_names.iter().cloned())
		.collect();
	let subscale_names: Vec<String> = subscale_features
		.iter()
		.map(|subscale| subscale.name.clone())
		.collect();

	let summary = preprocess_summary(
		config,
		binning_spec,
		&subscale_features,
		n_rows,
		split_index,
	);

	// Run each variant over the shared split.
	let variants = config
		.variants
		.clone()
		.unwrap_or_else(|| Variant::ALL.to_vec());
	let linear_options = config::train_options(config.linear.as_ref());
	let (max_coefficient, fit_options) =
		config::fit_options(config.riskscore.as_ref(), linear_options.clone());
	let mut variant_outputs = Vec::with_capacity(variants.len());
	for variant in variants {
		let training_total = match variant {
			Variant::Linear | Variant::RiskScore => 1,
			_ => subscale_features.len().to_u64().unwrap(),
		};
		let progress_counter = ProgressCounter::new(training_total);
		update_progress(Progress::Training(variant, progress_counter.clone()));
		let (probabilities, model_summary) = match variant {
			Variant::Linear => {
				let model = BinaryClassifier::train(
					features_train_all.view(),
					labels_train.view(),
					&linear_options,
					&|| {},
				);
				progress_counter.inc(1);
				(predict_linear(&model, features_test_all.view()), None)
			}
			Variant::RiskScore => {
				let model = fit_risk_score(
					features_train_all.view(),
					labels_train.view(),
					feature_names_all.clone(),
					max_coefficient,
					bounds_path,
					&fit_options,
				)?;
				progress_counter.inc(1);
				(
					predict_risk_score(&model, features_test_all.view()),
					Some(model.to_string()),
				)
			}
			Variant::TwoLayerLinear => {
				let (probabilities_train, probabilities_test, _) = train_first_layer_linear(
					&subscale_features,
					labels_train.view(),
					&linear_options,
					&progress_counter,
				);
				let second_layer = BinaryClassifier::train(
					probabilities_train.view(),
					labels_train.view(),
					&linear_options,
					&|| {},
				);
				let summary = second_layer_summary(&subscale_names, &second_layer);
				(
					predict_linear(&second_layer, probabilities_test.view()),
					Some(summary),
				)
			}
			Variant::RiskScoreThenLinear => {
				let (probabilities_train, probabilities_test, models) =
					train_first_layer_risk_score(
						&subscale_features,
						labels_train.view(),
						max_coefficient,
						bounds_path,
						&fit_options,
						&progress_counter,
					)?;
				let second_layer = BinaryClassifier::train(
					probabilities_train.view(),
					labels_train.view(),
					&linear_options,
					&|| {},
				);
				let mut summary = String::new();
				for (subscale, model) in izip!(subscale_features.iter(), models.iter()) {
					summary.push_str(&format!("{}:\n{}\n", subscale.name, model));
				}
				summary.push_str(&second_layer_summary(&subscale_names, &second_layer));
				(
					predict_linear(&second_layer, probabilities_test.view()),
					Some(summary),
				)
			}
			Variant::LinearThenRiskScore => {
				let (probabilities_train, probabilities_test, _) = train_first_layer_linear(
					&subscale_features,
					labels_train.view(),
					&linear_options,
					&progress_counter,
				);
				let model = fit_risk_score(
					probabilities_train.view(),
					labels_train.view(),
					subscale_names.clone(),
					max_coefficient,
					bounds_path,
					&fit_options,
				)?;
				(
					predict_risk_score(&model, probabilities_test.view()),
					Some(model.to_string()),
				)
			}
		};
		update_progress(Progress::Testing(variant));
		let mut classification_metrics = metrics::BinaryClassificationMetrics::default();
		classification_metrics.update(metrics::BinaryClassificationMetricsInput {
			probabilities: probabilities.as_slice().unwrap(),
			labels: labels_test.as_slice().unwrap(),
		});
		let roc_curve = metrics::compute_roc_curve(
			probabilities.as_slice().unwrap(),
			labels_test.as_slice().unwrap(),
		);
		let auc_roc = metrics::auc_roc(
			probabilities.as_slice().unwrap(),
			labels_test.as_slice().unwrap(),
		);
		variant_outputs.push(VariantOutput {
			variant,
			metrics: classification_metrics.finalize(),
			auc_roc,
			roc_curve,
			model_summary,
		});
	}

	Ok(CompareOutput {
		summary,
		variants: variant_outputs,
	})
}

struct SubscaleFeatures {
	name: String,
	feature_names: Vec<String>,
	features_train: Array2<f32>,
	features_test: Array2<f32>,
}

fn load_config(config_path: Option<&Path>) -> Result<Config> {
	match config_path {
		Some(config_path) => {
			let file = std::fs::File::open(config_path).with_context(|| {
				format!("failed to open config file {}", config_path.display())
			})?;
			serde_yaml::from_reader(file).with_context(|| {
				format!("failed to parse config file {}", config_path.display())
			})
		}
		None => Ok(Config::default()),
	}
}

fn load_dataframe(
	file_path: &Path,
	config: &Config,
	update_progress: &mut dyn FnMut(Progress),
) -> Result<DataFrame> {
	let column_types = config.column_types.as_ref().map(|column_types| {
		column_types
			.iter()
			.map(|(column_name, column_type)| (column_name.clone(), column_type.into()))
			.collect()
	});
	let len = std::fs::metadata(file_path)
		.with_context(|| format!("failed to read dataset file {}", file_path.display()))?
		.len();
	let progress_counter = ProgressCounter::new(len);
	update_progress(Progress::Loading(progress_counter.clone()));
	DataFrame::from_path(
		file_path,
		FromCsvOptions {
			column_types,
			..Default::default()
		},
		|byte| progress_counter.set(byte),
	)
	.with_context(|| format!("failed to load dataset file {}", file_path.display()))
}

/// Shuffle every column of the dataframe with an identically seeded rng, so all the columns get the same permutation. With the same seed, the resulting train/test split is identical from run to run, which is what makes the variant metrics comparable.
fn shuffle(dataframe: &mut DataFrame, config: &Config, update_progress: &mut dyn FnMut(Progress)) {
	let default_seed = 42;
	let seed = match &config.shuffle {
		None => Some(default_seed),
		Some(Shuffle::Enabled(true)) => Some(default_seed),
		Some(Shuffle::Enabled(false)) => None,
		Some(Shuffle::Options { seed }) => Some(*seed),
	};
	if let Some(seed) = seed {
		update_progress(Progress::Shuffling);
		for column in dataframe.columns.iter_mut() {
			let mut rng = Xoshiro256Plus::seed_from_u64(seed);
			match column {
				Column::Number(column) => column.data.shuffle(&mut rng),
				Column::Enum(column) => column.data.shuffle(&mut rng),
				Column::Text(column) => column.data.shuffle(&mut rng),
			}
		}
	}
}

/// Pull the target column out as 1-based label ids, where 1 is the first enum option (the negative class) and 2 is the second (the positive class).
fn target_labels(dataframe: &DataFrameView, target_column_name: &str) -> Result<Array1<usize>> {
	let column = dataframe.column(target_column_name).ok_or_else(|| {
		format_err!(
			"did not find target column \"{}\" in the dataset",
			target_column_name
		)
	})?;
	let column = column.as_enum().ok_or_else(|| {
		format_err!(
			"target column \"{}\" must be an enum column with two options",
			target_column_name
		)
	})?;
	if column.options.len() != 2 {
		return Err(format_err!(
			"target column \"{}\" must have exactly two options, found {}",
			target_column_name,
			column.options.len()
		));
	}
	let labels = column
		.data
		.iter()
		.map(|value| {
			value.map(|value| value.get()).ok_or_else(|| {
				format_err!(
					"target column \"{}\" contains an invalid value",
					target_column_name
				)
			})
		})
		.collect::<Result<Vec<usize>>>()?;
	Ok(Array1::from(labels))
}

/// A variable with breakpoints becomes a one-hot block, a variable without passes through unchanged.
fn subscale_feature_groups(
	variable_names: &[String],
	binning_spec: &BinningSpec,
) -> Vec<FeatureGroup> {
	variable_names
		.iter()
		.map(|variable_name| match binning_spec.get(variable_name) {
			Some(intervals) => FeatureGroup::Binned(BinnedFeatureGroup {
				source_column_name: variable_name.clone(),
				intervals: intervals.to_vec(),
			}),
			None => FeatureGroup::Identity(IdentityFeatureGroup {
				source_column_name: variable_name.clone(),
			}),
		})
		.collect()
}

fn preprocess_summary(
	config: &Config,
	binning_spec: &BinningSpec,
	subscale_features: &[SubscaleFeatures],
	n_rows: usize,
	split_index: usize,
) -> PreprocessSummary {
	let n_variables = config
		.subscales
		.iter()
		.map(|subscale| subscale.variables.len())
		.sum::<usize>();
	let n_binned_variables = config
		.subscales
		.iter()
		.flat_map(|subscale| subscale.variables.iter())
		.filter(|variable_name| binning_spec.contains(variable_name))
		.count();
	let subscales = izip!(config.subscales.iter(), subscale_features.iter())
		.map(|(subscale, features)| SubscaleSummary {
			name: subscale.name.clone(),
			variable_names: subscale.variables.clone(),
			n_features: features.feature_names.len(),
		})
		.collect();
	PreprocessSummary {
		n_rows,
		n_rows_train: split_index,
		n_rows_test: n_rows - split_index,
		n_variables,
		n_binned_variables,
		n_unbinned_variables: n_variables - n_binned_variables,
		subscales,
	}
}

fn predict_linear(model: &BinaryClassifier, features: ArrayView2<f32>) -> Array1<f32> {
	let mut probabilities = Array::zeros(features.nrows());
	model.predict(features, probabilities.view_mut());
	probabilities
}

fn predict_risk_score(model: &RiskScoreModel, features: ArrayView2<f32>) -> Array1<f32> {
	let mut probabilities = Array::zeros(features.nrows());
	model.predict(features, probabilities.view_mut());
	probabilities
}

fn fit_risk_score(
	features_train: ArrayView2<f32>,
	labels_train: ArrayView1<usize>,
	variable_names: Vec<String>,
	max_coefficient: i32,
	bounds_path: Option<&Path>,
	options: &FitOptions,
) -> Result<RiskScoreModel> {
	let mut coefficient_set = CoefficientSet::new(variable_names, max_coefficient);
	if let Some(bounds_path) = bounds_path {
		coefficient_set.apply_bounds_csv(bounds_path)?;
	}
	coefficient_set.update_intercept_bounds(features_train, options.max_offset);
	Ok(RiskScoreModel::fit(
		features_train,
		labels_train,
		&coefficient_set,
		options,
		&|| {},
	))
}

/// Fit one logistic regression per subscale and return the per-subscale probability columns for the train and test rows, which are the second layer's features.
fn train_first_layer_linear(
	subscale_features: &[SubscaleFeatures],
	labels_train: ArrayView1<usize>,
	options: &subscale_linear::TrainOptions,
	progress_counter: &ProgressCounter,
) -> (Array2<f32>, Array2<f32>, Vec<BinaryClassifier>) {
	let results: Vec<(Array1<f32>, Array1<f32>, BinaryClassifier)> = subscale_features
		.par_iter()
		.map(|subscale| {
			let model = BinaryClassifier::train(
				subscale.features_train.view(),
				labels_train,
				options,
				&|| {},
			);
			let probabilities_train = predict_linear(&model, subscale.features_train.view());
			let probabilities_test = predict_linear(&model, subscale.features_test.view());
			progress_counter.inc(1);
			(probabilities_train, probabilities_test, model)
		})
		.collect();
	let probabilities_train =
		probability_matrix(results.iter().map(|(train, _, _)| train.view()).collect());
	let probabilities_test =
		probability_matrix(results.iter().map(|(_, test, _)| test.view()).collect());
	let models = results.into_iter().map(|(_, _, model)| model).collect();
	(probabilities_train, probabilities_test, models)
}

/// Fit one risk score model per subscale and return the per-subscale probability columns for the train and test rows.
fn train_first_layer_risk_score(
	subscale_features: &[SubscaleFeatures],
	labels_train: ArrayView1<usize>,
	max_coefficient: i32,
	bounds_path: Option<&Path>,
	options: &FitOptions,
	progress_counter: &ProgressCounter,
) -> Result<(Array2<f32>, Array2<f32>, Vec<RiskScoreModel>)> {
	let results: Vec<(Array1<f32>, Array1<f32>, RiskScoreModel)> = subscale_features
		.par_iter()
		.map(|subscale| {
			let model = fit_risk_score(
				subscale.features_train.view(),
				labels_train,
				subscale.feature_names.clone(),
				max_coefficient,
				bounds_path,
				options,
			)?;
			let probabilities_train = predict_risk_score(&model, subscale.features_train.view());
			let probabilities_test = predict_risk_score(&model, subscale.features_test.view());
			progress_counter.inc(1);
			Ok((probabilities_train, probabilities_test, model))
		})
		.collect::<Result<Vec<_>>>()?;
	let probabilities_train =
		probability_matrix(results.iter().map(|(train, _, _)| train.view()).collect());
	let probabilities_test =
		probability_matrix(results.iter().map(|(_, test, _)| test.view()).collect());
	let models = results.into_iter().map(|(_, _, model)| model).collect();
	Ok((probabilities_train, probabilities_test, models))
}

fn probability_matrix(columns: Vec<ArrayView1<f32>>) -> Array2<f32> {
	let n_rows = columns.first().map(|column| column.len()).unwrap_or(0);
	let mut matrix = Array::zeros((n_rows, columns.len()));
	for (index, column) in columns.iter().enumerate() {
		matrix.column_mut(index).assign(column);
	}
	matrix
}

fn second_layer_summary(subscale_names: &[String], model: &BinaryClassifier) -> String {
	let width = subscale_names
		.iter()
		.map(|subscale_name| subscale_name.len())
		.chain(std::iter::once("subscale".len()))
		.max()
		.unwrap_or(0);
	let mut summary = String::new();
	summary.push_str(&format!(
		"{:<width$}  {:>8}\n",
		"subscale",
		"weight",
		width = width
	));
	for (subscale_name, weight) in izip!(subscale_names.iter(), model.weights.iter()) {
		summary.push_str(&format!(
			"{:<width$}  {:>8.4}\n",
			subscale_name,
			weight,
			width = width
		));
	}
	summary.push_str(&format!(
		"{:<width$}  {:>8.4}\n",
		"bias",
		model.bias,
		width = width
	));
	summary
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::config::SubscaleConfig;
	use subscale_dataframe::{EnumColumn, NumberColumn};

	fn test_dataframe() -> DataFrame {
		// One perfectly predictive variable, rows alternating between the classes.
		let n_rows = 20;
		let mut x = Vec::with_capacity(n_rows);
		let mut target = Vec::with_capacity(n_rows);
		for index in 0..n_rows {
			if index % 2 == 0 {
				x.push(1.0);
				target.push(std::num::NonZeroUsize::new(2));
			} else {
				x.push(0.0);
				target.push(std::num::NonZeroUsize::new(1));
			}
		}
		DataFrame {
			columns: vec![
				Column::Number(NumberColumn {
					name: "x".to_owned(),
					data: x,
				}),
				Column::Enum(EnumColumn {
					name: "target".to_owned(),
					options: vec!["-1".to_owned(), "1".to_owned()],
					data: target,
				}),
			],
		}
	}

	fn test_config() -> Config {
		Config {
			test_fraction: Some(0.2),
			shuffle: Some(Shuffle::Enabled(false)),
			linear: Some(crate::config::LinearModelConfig {
				l2_regularization: None,
				learning_rate: Some(0.5),
				max_epochs: Some(200),
				n_examples_per_batch: Some(16),
				early_stopping_options: None,
			}),
			subscales: vec![SubscaleConfig {
				name: "s1".to_owned(),
				variables: vec!["x".to_owned()],
			}],
			..Default::default()
		}
	}

	fn test_binning_spec() -> BinningSpec {
		let csv = "var_name,split_list\nx,\"(-INF, 0.5]\"\nx,\"(0.5, +INF)\"\n";
		BinningSpec::from_reader(&mut csv::Reader::from_reader(std::io::Cursor::new(csv)))
			.unwrap()
	}

	#[test]
	fn test_compare_separable() {
		let output = compare_dataframe(
			test_dataframe(),
			"target",
			&test_config(),
			&test_binning_spec(),
			None,
			&mut |_| {},
		)
		.unwrap();
		assert_eq!(output.summary.n_rows, 20);
		assert_eq!(output.summary.n_rows_train, 16);
		assert_eq!(output.summary.n_rows_test, 4);
		assert_eq!(output.summary.n_binned_variables, 1);
		assert_eq!(output.summary.subscales[0].n_features, 2);
		// Every variant separates the classes perfectly on this dataset.
		assert_eq!(output.variants.len(), 5);
		for variant_output in output.variants.iter() {
			assert_eq!(variant_output.metrics.accuracy, 1.0);
			assert_eq!(variant_output.metrics.f1_score, 1.0);
			assert!(f32::abs(variant_output.auc_roc - 1.0) < f32::EPSILON);
		}
		// The risk score variants carry a scorecard summary.
		let risk_score_output = output
			.variants
			.iter()
			.find(|variant_output| variant_output.variant == Variant::RiskScore)
			.unwrap();
		assert!(risk_score_output
			.model_summary
			.as_ref()
			.unwrap()
			.contains("score offset"));
	}

	#[test]
	fn test_compare_requires_subscales() {
		let config = Config {
			subscales: Vec::new(),
			..Default::default()
		};
		let error = compare_dataframe(
			test_dataframe(),
			"target",
			&config,
			&test_binning_spec(),
			None,
			&mut |_| {},
		)
		.unwrap_err();
		assert!(error.to_string().contains("subscale"));
	}

	#[test]
	fn test_compare_missing_target() {
		let error = compare_dataframe(
			test_dataframe(),
			"missing",
			&test_config(),
			&test_binning_spec(),
			None,
			&mut |_| {},
		)
		.unwrap_err();
		assert!(error.to_string().contains("missing"));
	}

	#[test]
	fn test_shuffle_is_deterministic_and_row_aligned() {
		let mut left = test_dataframe();
		let mut right = test_dataframe();
		let config = Config::default();
		shuffle(&mut left, &config, &mut |_| {});
		shuffle(&mut right, &config, &mut |_| {});
		assert_eq!(left, right);
		// The same permutation is applied to every column, so rows stay aligned.
		let x = left.columns[0].as_number().unwrap();
		let target = left.columns[1].as_enum().unwrap();
		for (x, target) in izip!(x.data.iter(), target.data.iter()) {
			let expected = if *x == 1.0 { 2 } else { 1 };
			assert_eq!(target.unwrap().get(), expected);
		}
	}
}
