use crate::{CoefficientSet, RiskScoreModel};
use itertools::izip;
use ndarray::prelude::*;
use subscale_linear::{BinaryClassifier, TrainOptions};

/// These are the options passed to [`RiskScoreModel::fit`](struct.RiskScoreModel.html#method.fit).
#[derive(Clone, Debug)]
pub struct FitOptions {
	/// This is the L0 penalty added to the loss for each variable with a nonzero coefficient. Larger values produce sparser models.
	pub c0_penalty: f32,
	/// This is the maximum number of variables allowed a nonzero coefficient. `None` allows all of them.
	pub max_l0: Option<usize>,
	/// This is the largest magnitude allowed for the intercept when calling [`CoefficientSet::update_intercept_bounds`](struct.CoefficientSet.html#method.update_intercept_bounds).
	pub max_offset: i32,
	/// This is the maximum number of polishing passes over the coordinates.
	pub polish_passes: usize,
	/// These are the options for the continuous logistic fit that seeds the lattice search.
	pub linear_options: TrainOptions,
}

impl Default for FitOptions {
	fn default() -> FitOptions {
		FitOptions {
			c0_penalty: 1e-6,
			max_l0: None,
			max_offset: 50,
			polish_passes: 10,
			linear_options: TrainOptions::default(),
		}
	}
}

impl RiskScoreModel {
	/**
	Fit a risk score model.

	The fit seeds the integer search with a continuous logistic fit scaled into the coefficient box, rounds the coordinates one at a time in order of rounding gap choosing floor or ceiling by loss, zeroes the weakest coefficients until the L0 cap holds, and finally polishes with discrete coordinate descent: single point moves that lower the penalized loss, repeated until a full pass makes no improvement.
	*/
	pub fn fit(
		features: ArrayView2<f32>,
		labels: ArrayView1<usize>,
		coefficient_set: &CoefficientSet,
		options: &FitOptions,
		progress: &impl Fn(),
	) -> RiskScoreModel {
		let n_variables = coefficient_set.n_variables();
		let lower_bounds = &coefficient_set.lower_bounds;
		let upper_bounds = &coefficient_set.upper_bounds;

		// Seed with a continuous logistic fit, scaled so the largest weight fills the coefficient box.
		let continuous =
			BinaryClassifier::train(features, labels, &options.linear_options, progress);
		let box_max = izip!(lower_bounds.iter(), upper_bounds.iter())
			.map(|(lower, upper)| lower.abs().max(upper.abs()))
			.max()
			.unwrap_or(0) as f32;
		let max_weight = continuous
			.weights
			.iter()
			.fold(0.0f32, |max, weight| max.max(weight.abs()));
		let scale = if max_weight > 0.0 && box_max > 0.0 {
			box_max / max_weight
		} else {
			1.0
		};
		let mut relaxed: Vec<f32> = izip!(
			continuous.weights.iter(),
			lower_bounds.iter(),
			upper_bounds.iter(),
		)
		.map(|(weight, lower, upper)| (weight * scale).max(*lower as f32).min(*upper as f32))
		.collect();
		let relaxed_intercept = (continuous.bias * scale)
			.max(coefficient_set.intercept_lower_bound as f32)
			.min(coefficient_set.intercept_upper_bound as f32);

		let mut objective = Objective::new(features, labels, &relaxed, relaxed_intercept);

		// Sequential rounding: round the coordinates with the largest rounding gap first, choosing floor or ceiling by loss.
		let mut order: Vec<usize> = (0..n_variables).collect();
		order.sort_by(|a, b| {
			let gap_a = (relaxed[*a] - relaxed[*a].round()).abs();
			let gap_b = (relaxed[*b] - relaxed[*b].round()).abs();
			gap_b.partial_cmp(&gap_a).unwrap()
		});
		let mut coefficients: Vec<i32> = vec![0; n_variables];
		for index in order {
			let value = relaxed[index];
			let floor = value.floor();
			let ceiling = value.ceil();
			let loss_floor = objective.loss_after_delta(Some(index), floor - value);
			let loss_ceiling = objective.loss_after_delta(Some(index), ceiling - value);
			let rounded = if loss_floor <= loss_ceiling {
				floor
			} else {
				ceiling
			};
			objective.apply_delta(Some(index), rounded - value);
			relaxed[index] = rounded;
			coefficients[index] = rounded as i32;
		}
		let rounded_intercept = {
			let floor = relaxed_intercept.floor();
			let ceiling = relaxed_intercept.ceil();
			let loss_floor = objective.loss_after_delta(None, floor - relaxed_intercept);
			let loss_ceiling = objective.loss_after_delta(None, ceiling - relaxed_intercept);
			if loss_floor <= loss_ceiling {
				floor
			} else {
				ceiling
			}
		};
		objective.apply_delta(None, rounded_intercept - relaxed_intercept);
		let mut intercept = rounded_intercept as i32;

		// Enforce the L0 cap by zeroing the coefficients whose removal costs the least loss.
		let max_l0 = options.max_l0.unwrap_or(n_variables);
		let mut l0 = coefficients
			.iter()
			.filter(|coefficient| **coefficient != 0)
			.count();
		let mut loss = objective.loss();
		while l0 > max_l0 {
			let mut best: Option<(usize, f32)> = None;
			for (index, coefficient) in coefficients.iter().enumerate() {
				if *coefficient == 0 {
					continue;
				}
				let loss_without = objective.loss_after_delta(Some(index), -*coefficient as f32);
				if best
					.map(|(_, best_loss)| loss_without < best_loss)
					.unwrap_or(true)
				{
					best = Some((index, loss_without));
				}
			}
			let (index, loss_without) = best.unwrap();
			objective.apply_delta(Some(index), -coefficients[index] as f32);
			coefficients[index] = 0;
			l0 -= 1;
			loss = loss_without;
		}

		// Discrete coordinate descent: single point moves that lower the penalized loss.
		for _ in 0..options.polish_passes {
			let mut improved = false;
			for index in 0..n_variables {
				let mut best: Option<(i32, f32, usize)> = None;
				for delta in &[-1i32, 1] {
					let candidate = coefficients[index] + delta;
					if candidate < lower_bounds[index] || candidate > upper_bounds[index] {
						continue;
					}
					let candidate_l0 = l0 - (coefficients[index] != 0) as usize
						+ (candidate != 0) as usize;
					if candidate_l0 > max_l0 {
						continue;
					}
					let candidate_loss = objective.loss_after_delta(Some(index), *delta as f32);
					let candidate_objective =
						candidate_loss + options.c0_penalty * candidate_l0 as f32;
					let current_objective = loss + options.c0_penalty * l0 as f32;
					let best_objective = best
						.map(|(_, best_loss, best_l0)| {
							best_loss + options.c0_penalty * best_l0 as f32
						})
						.unwrap_or(current_objective);
					if candidate_objective < best_objective {
						best = Some((*delta, candidate_loss, candidate_l0));
					}
				}
				if let Some((delta, candidate_loss, candidate_l0)) = best {
					objective.apply_delta(Some(index), delta as f32);
					coefficients[index] += delta;
					loss = candidate_loss;
					l0 = candidate_l0;
					improved = true;
				}
			}
			for delta in &[-1i32, 1] {
				let candidate = intercept + delta;
				if candidate < coefficient_set.intercept_lower_bound
					|| candidate > coefficient_set.intercept_upper_bound
				{
					continue;
				}
				let candidate_loss = objective.loss_after_delta(None, *delta as f32);
				if candidate_loss < loss {
					objective.apply_delta(None, *delta as f32);
					intercept = candidate;
					loss = candidate_loss;
					improved = true;
				}
			}
			progress();
			if !improved {
				break;
			}
		}

		RiskScoreModel {
			variable_names: coefficient_set.variable_names.clone(),
			coefficients,
			intercept,
		}
	}
}

/// Tracks the logistic loss of the current solution and evaluates single coordinate moves without recomputing the full dot product.
struct Objective<'a> {
	features: ArrayView2<'a, f32>,
	labels_signed: Array1<f32>,
	scores: Array1<f32>,
}

impl<'a> Objective<'a> {
	fn new(
		features: ArrayView2<'a, f32>,
		labels: ArrayView1<usize>,
		coefficients: &[f32],
		intercept: f32,
	) -> Objective<'a> {
		let labels_signed = labels.mapv(|label| match label {
			1 => -1.0,
			2 => 1.0,
			_ => unreachable!(),
		});
		let coefficients = Array1::from(coefficients.to_vec());
		let scores = features.dot(&coefficients) + intercept;
		Objective {
			features,
			labels_signed,
			scores,
		}
	}

	fn loss(&self) -> f32 {
		let sum: f32 = izip!(self.scores.iter(), self.labels_signed.iter())
			.map(|(score, label)| log1p_exp(-label * score))
			.sum();
		sum / self.scores.len() as f32
	}

	/// The loss if `delta` were added to the coefficient of `column`, or to the intercept when `column` is `None`.
	fn loss_after_delta(&self, column: Option<usize>, delta: f32) -> f32 {
		let sum: f32 = match column {
			Some(column) => izip!(
				self.scores.iter(),
				self.features.column(column),
				self.labels_signed.iter(),
			)
			.map(|(score, value, label)| log1p_exp(-label * (score + delta * value)))
			.sum(),
			None => izip!(self.scores.iter(), self.labels_signed.iter())
				.map(|(score, label)| log1p_exp(-label * (score + delta)))
				.sum(),
		};
		sum / self.scores.len() as f32
	}

	fn apply_delta(&mut self, column: Option<usize>, delta: f32) {
		match column {
			Some(column) => {
				for (score, value) in izip!(self.scores.iter_mut(), self.features.column(column)) {
					*score += delta * value;
				}
			}
			None => {
				for score in self.scores.iter_mut() {
					*score += delta;
				}
			}
		}
	}
}

/// A numerically stable `ln(1 + exp(value))`.
fn log1p_exp(value: f32) -> f32 {
	if value > 0.0 {
		value + (-value).exp().ln_1p()
	} else {
		value.exp().ln_1p()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	fn test_data() -> (Array2<f32>, Array1<usize>) {
		// Two complementary one-hot columns, the first of which predicts the label.
		let features = ndarray::arr2(&[
			[1.0, 0.0],
			[1.0, 0.0],
			[1.0, 0.0],
			[1.0, 0.0],
			[0.0, 1.0],
			[0.0, 1.0],
			[0.0, 1.0],
			[0.0, 1.0],
		]);
		let labels = ndarray::arr1(&[2, 2, 2, 2, 1, 1, 1, 1]);
		(features, labels)
	}

	fn test_options() -> FitOptions {
		FitOptions {
			linear_options: subscale_linear::TrainOptions {
				early_stopping_options: None,
				learning_rate: 0.5,
				max_epochs: 200,
				n_examples_per_batch: 8,
				..Default::default()
			},
			..Default::default()
		}
	}

	#[test]
	fn test_fit_separable() {
		let (features, labels) = test_data();
		let mut coefficient_set =
			CoefficientSet::new(vec!["a".to_owned(), "b".to_owned()], 5);
		coefficient_set.update_intercept_bounds(features.view(), 5);
		let options = test_options();
		let model = RiskScoreModel::fit(
			features.view(),
			labels.view(),
			&coefficient_set,
			&options,
			&|| {},
		);
		for (coefficient, (lower, upper)) in izip!(
			model.coefficients.iter(),
			izip!(
				coefficient_set.lower_bounds.iter(),
				coefficient_set.upper_bounds.iter()
			),
		) {
			assert!(coefficient >= lower && coefficient <= upper);
		}
		assert!(model.intercept >= coefficient_set.intercept_lower_bound);
		assert!(model.intercept <= coefficient_set.intercept_upper_bound);
		let mut probabilities = Array::zeros(features.nrows());
		model.predict(features.view(), probabilities.view_mut());
		for (probability, label) in probabilities.iter().zip(labels.iter()) {
			match label {
				2 => assert!(*probability > 0.5),
				1 => assert!(*probability < 0.5),
				_ => unreachable!(),
			}
		}
	}

	#[test]
	fn test_fit_max_l0() {
		let (features, labels) = test_data();
		let mut coefficient_set =
			CoefficientSet::new(vec!["a".to_owned(), "b".to_owned()], 5);
		coefficient_set.update_intercept_bounds(features.view(), 5);
		let options = FitOptions {
			max_l0: Some(1),
			..test_options()
		};
		let model = RiskScoreModel::fit(
			features.view(),
			labels.view(),
			&coefficient_set,
			&options,
			&|| {},
		);
		assert!(model.l0_norm() <= 1);
	}
}
