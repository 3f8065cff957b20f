/*!
This crate fits risk score models: linear classifiers whose coefficients are small integers, so a prediction can be made by adding up a handful of points and reading the total off a scorecard.

Fitting searches the integer lattice with the heuristic path: a continuous logistic fit is scaled into the coefficient box, rounded one coordinate at a time by loss, and then polished with discrete coordinate descent under an L0 penalty. The fit is deterministic and carries no certificate of optimality.
*/

use itertools::izip;
use ndarray::prelude::*;
use std::ops::Neg;

mod coefficient_set;
mod fit;

pub use self::coefficient_set::CoefficientSet;
pub use self::fit::FitOptions;

/// A fitted risk score model. `coefficients[i]` is the integer number of points assigned to `variable_names[i]`, and `intercept` is the score offset.
#[derive(Clone, Debug, PartialEq)]
pub struct RiskScoreModel {
	pub variable_names: Vec<String>,
	pub coefficients: Vec<i32>,
	pub intercept: i32,
}

impl RiskScoreModel {
	/// Compute the integer score of each example: the dot product of the features with the coefficients, plus the intercept.
	pub fn score(&self, features: ArrayView2<f32>) -> Array1<f32> {
		let coefficients = self
			.coefficients
			.iter()
			.map(|coefficient| *coefficient as f32)
			.collect::<Array1<f32>>();
		features.dot(&coefficients) + self.intercept as f32
	}

	/// Write the predicted probabilities of the positive class into `probabilities` for the input `features`, which is the sigmoid of the score.
	pub fn predict(&self, features: ArrayView2<f32>, mut probabilities: ArrayViewMut1<f32>) {
		let scores = self.score(features);
		for (probability, score) in izip!(probabilities.iter_mut(), scores.iter()) {
			*probability = 1.0 / (score.neg().exp() + 1.0);
		}
	}

	/// The number of variables with a nonzero coefficient. The intercept is not counted.
	pub fn l0_norm(&self) -> usize {
		self.coefficients
			.iter()
			.filter(|coefficient| **coefficient != 0)
			.count()
	}
}

impl std::fmt::Display for RiskScoreModel {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		let width = self
			.variable_names
			.iter()
			.map(|variable_name| variable_name.len())
			.chain(std::iter::once("score offset".len()))
			.max()
			.unwrap_or(0);
		writeln!(f, "{:<width$}  {:>6}", "variable", "points", width = width)?;
		for (variable_name, coefficient) in
			izip!(self.variable_names.iter(), self.coefficients.iter())
		{
			if *coefficient != 0 {
				writeln!(
					f,
					"{:<width$}  {:>6}",
					variable_name,
					coefficient,
					width = width
				)?;
			}
		}
		writeln!(
			f,
			"{:<width$}  {:>6}",
			"score offset",
			self.intercept,
			width = width
		)?;
		Ok(())
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_score_and_predict() {
		let model = RiskScoreModel {
			variable_names: vec!["a".to_owned(), "b".to_owned()],
			coefficients: vec![2, -1],
			intercept: 1,
		};
		let features = ndarray::arr2(&[[1.0, 0.0], [0.0, 1.0], [1.0, 1.0]]);
		let scores = model.score(features.view());
		assert_eq!(scores, ndarray::arr1(&[3.0, 0.0, 2.0]));
		let mut probabilities = Array::zeros(3);
		model.predict(features.view(), probabilities.view_mut());
		assert!(probabilities[0] > 0.9);
		assert_eq!(probabilities[1], 0.5);
		assert!(probabilities[2] > 0.5);
	}

	#[test]
	fn test_l0_norm() {
		let model = RiskScoreModel {
			variable_names: vec!["a".to_owned(), "b".to_owned(), "c".to_owned()],
			coefficients: vec![2, 0, -1],
			intercept: 4,
		};
		assert_eq!(model.l0_norm(), 2);
	}

	#[test]
	fn test_display() {
		let model = RiskScoreModel {
			variable_names: vec!["estimate_1".to_owned(), "estimate_2".to_owned()],
			coefficients: vec![3, 0],
			intercept: -2,
		};
		let display = model.to_string();
		assert!(display.contains("estimate_1"));
		assert!(!display.contains("estimate_2"));
		assert!(display.contains("score offset"));
	}
}
