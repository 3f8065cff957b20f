/*!
This module defines the `Config` struct, which configures the architecture comparison: which variants run, how the dataset is split, how the variables are grouped into subscales, and the hyperparameters of the two model families.
*/

use std::collections::BTreeMap;

#[derive(Debug, Default, serde::Deserialize)]
pub struct Config {
	/// Explicit types for columns whose type should not be inferred from the csv.
	pub column_types: Option<BTreeMap<String, ColumnType>>,
	pub test_fraction: Option<f32>,
	pub shuffle: Option<Shuffle>,
	/// The variants to run. If this is `None`, every variant runs.
	pub variants: Option<Vec<Variant>>,
	pub linear: Option<LinearModelConfig>,
	pub riskscore: Option<RiskScoreModelConfig>,
	/// The subscales, in order. The order of the subscales and of the variables within each subscale fixes the feature column order.
	#[serde(default)]
	pub subscales: Vec<SubscaleConfig>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(tag = "type")]
pub enum ColumnType {
	#[serde(rename = "number")]
	Number,
	#[serde(rename = "enum")]
	Enum { options: Vec<String> },
	#[serde(rename = "text")]
	Text,
}

impl From<&ColumnType> for subscale_dataframe::ColumnType {
	fn from(column_type: &ColumnType) -> subscale_dataframe::ColumnType {
		match column_type {
			ColumnType::Number => subscale_dataframe::ColumnType::Number,
			ColumnType::Enum { options } => subscale_dataframe::ColumnType::Enum {
				options: options.clone(),
			},
			ColumnType::Text => subscale_dataframe::ColumnType::Text,
		}
	}
}

#[derive(Debug, serde::Deserialize)]
#[serde(untagged)]
pub enum Shuffle {
	Enabled(bool),
	Options { seed: u64 },
}

#[derive(Debug, serde::Deserialize)]
pub struct SubscaleConfig {
	pub name: String,
	pub variables: Vec<String>,
}

/// The model architectures that can be compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Deserialize)]
pub enum Variant {
	/// A single logistic regression over the full one-hot feature matrix.
	#[serde(rename = "linear")]
	Linear,
	/// A single risk score model over the full one-hot feature matrix.
	#[serde(rename = "risk-score")]
	RiskScore,
	/// Per-subscale logistic regressions whose probabilities feed a second layer logistic regression.
	#[serde(rename = "two-layer-linear")]
	TwoLayerLinear,
	/// Per-subscale risk score models whose probabilities feed a second layer logistic regression.
	#[serde(rename = "risk-score-then-linear")]
	RiskScoreThenLinear,
	/// Per-subscale logistic regressions whose probabilities feed a second layer risk score model.
	#[serde(rename = "linear-then-risk-score")]
	LinearThenRiskScore,
}

impl Variant {
	pub const ALL: [Variant; 5] = [
		Variant::Linear,
		Variant::RiskScore,
		Variant::TwoLayerLinear,
		Variant::RiskScoreThenLinear,
		Variant::LinearThenRiskScore,
	];
}

impl std::fmt::Display for Variant {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let name = match self {
			Variant::Linear => "logistic regression",
			Variant::RiskScore => "risk score",
			Variant::TwoLayerLinear => "two layer logistic regression",
			Variant::RiskScoreThenLinear => "risk score then logistic regression",
			Variant::LinearThenRiskScore => "logistic regression then risk score",
		};
		write!(f, "{}", name)
	}
}

#[derive(Debug, serde::Deserialize)]
pub struct LinearModelConfig {
	pub l2_regularization: Option<f32>,
	pub learning_rate: Option<f32>,
	pub max_epochs: Option<usize>,
	pub n_examples_per_batch: Option<usize>,
	pub early_stopping_options: Option<EarlyStoppingOptionsConfig>,
}

#[derive(Debug, serde::Deserialize)]
pub struct EarlyStoppingOptionsConfig {
	pub early_stopping_fraction: f32,
	pub early_stopping_rounds: usize,
	pub early_stopping_threshold: f32,
}

#[derive(Debug, serde::Deserialize)]
pub struct RiskScoreModelConfig {
	pub max_coefficient: Option<i32>,
	pub max_l0: Option<usize>,
	pub c0_penalty: Option<f32>,
	pub max_offset: Option<i32>,
	pub polish_passes: Option<usize>,
}

/// Build the logistic regression train options from the config, falling back to the defaults for anything unspecified.
pub fn train_options(config: Option<&LinearModelConfig>) -> subscale_linear::TrainOptions {
	let mut options = subscale_linear::TrainOptions::default();
	if let Some(config) = config {
		if let Some(l2_regularization) = config.l2_regularization {
			options.l2_regularization = l2_regularization;
		}
		if let Some(learning_rate) = config.learning_rate {
			options.learning_rate = learning_rate;
		}
		if let Some(max_epochs) = config.max_epochs {
			options.max_epochs = max_epochs;
		}
		if let Some(n_examples_per_batch) = config.n_examples_per_batch {
			options.n_examples_per_batch = n_examples_per_batch;
		}
		if let Some(early_stopping_options) = &config.early_stopping_options {
			options.early_stopping_options = Some(subscale_linear::EarlyStoppingOptions {
				early_stopping_fraction: early_stopping_options.early_stopping_fraction,
				n_epochs_without_improvement_to_stop: early_stopping_options
					.early_stopping_rounds,
				min_decrease_in_loss_for_significant_change: early_stopping_options
					.early_stopping_threshold,
			});
		}
	}
	options
}

/// The default coefficient magnitude for risk score models.
pub const DEFAULT_MAX_COEFFICIENT: i32 = 10;

/// Build the risk score fit options and the coefficient magnitude from the config.
pub fn fit_options(
	config: Option<&RiskScoreModelConfig>,
	linear_options: subscale_linear::TrainOptions,
) -> (i32, subscale_riskscore::FitOptions) {
	let mut options = subscale_riskscore::FitOptions {
		linear_options,
		..Default::default()
	};
	let mut max_coefficient = DEFAULT_MAX_COEFFICIENT;
	if let Some(config) = config {
		if let Some(value) = config.max_coefficient {
			max_coefficient = value;
		}
		if let Some(max_l0) = config.max_l0 {
			options.max_l0 = Some(max_l0);
		}
		if let Some(c0_penalty) = config.c0_penalty {
			options.c0_penalty = c0_penalty;
		}
		if let Some(max_offset) = config.max_offset {
			options.max_offset = max_offset;
		}
		if let Some(polish_passes) = config.polish_passes {
			options.polish_passes = polish_passes;
		}
	}
	(max_coefficient, options)
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_deserialize() {
		let config: Config = serde_yaml::from_str(
			r#"
test_fraction: 0.3
shuffle:
  seed: 666
variants:
  - linear
  - risk-score-then-linear
linear:
  learning_rate: 0.05
  max_epochs: 500
riskscore:
  max_coefficient: 5
subscales:
  - name: trades
    variables:
      - NumTrades60Ever2DerogPubRec
      - NumTrades90Ever2DerogPubRec
  - name: delinquency
    variables:
      - MaxDelq2PublicRecLast12M
"#,
		)
		.unwrap();
		assert_eq!(config.test_fraction, Some(0.3));
		assert!(matches!(config.shuffle, Some(Shuffle::Options { seed: 666 })));
		assert_eq!(
			config.variants,
			Some(vec![Variant::Linear, Variant::RiskScoreThenLinear])
		);
		assert_eq!(config.subscales.len(), 2);
		assert_eq!(config.subscales[0].name, "trades");
		assert_eq!(config.subscales[0].variables.len(), 2);
		let options = train_options(config.linear.as_ref());
		assert_eq!(options.learning_rate, 0.05);
		assert_eq!(options.max_epochs, 500);
		let (max_coefficient, options) = fit_options(config.riskscore.as_ref(), options);
		assert_eq!(max_coefficient, 5);
		assert_eq!(options.polish_passes, 10);
	}

	#[test]
	fn test_deserialize_shuffle_disabled() {
		let config: Config = serde_yaml::from_str("shuffle: false\n").unwrap();
		assert!(matches!(config.shuffle, Some(Shuffle::Enabled(false))));
	}
}
