use std::cmp::Reverse;
use subscale_util::finite::ToFinite;

/// This function computes the area under the receiver operating characteristic curve using the trapezoid method.
pub fn auc_roc(probabilities: &[f32], labels: &[usize]) -> f32 {
	let roc_curve = compute_roc_curve(probabilities, labels);
	// Compute the riemann sum of the roc curve.
	(0..roc_curve.len() - 1)
		.map(|i| {
			let left = &roc_curve[i];
			let right = &roc_curve[i + 1];
			let y_left = left.true_positive_rate;
			let y_right = right.true_positive_rate;
			let y_average = (y_left + y_right) / 2.0;
			let dx = right.false_positive_rate - left.false_positive_rate;
			y_average * dx
		})
		.sum()
}

/// A single point on the receiver operating characteristic curve.
#[derive(Clone, Debug, PartialEq)]
pub struct RocCurvePoint {
	/// The classification threshold.
	pub threshold: f32,
	/// The true positive rate for all predictions with probability >= threshold.
	pub true_positive_rate: f32,
	/// The false positive rate for all predictions with probability >= threshold.
	pub false_positive_rate: f32,
}

/// This function computes the ROC curve, which plots the false positive rate against the true positive rate for each distinct classification threshold. Labels are 1-based class ids, where 2 is the positive class.
pub fn compute_roc_curve(probabilities: &[f32], labels: &[usize]) -> Vec<RocCurvePoint> {
	let mut tps_fps = compute_tps_fps_by_threshold(probabilities, labels);
	for i in 1..tps_fps.len() {
		tps_fps[i].true_positives += tps_fps[i - 1].true_positives;
		tps_fps[i].false_positives += tps_fps[i - 1].false_positives;
	}
	let count_positives = labels.iter().filter(|label| **label == 2).count();
	let count_negatives = labels.len() - count_positives;
	// Start the curve at (0, 0) with a dummy threshold of 1.0.
	let mut roc_curve = vec![RocCurvePoint {
		threshold: 1.0,
		true_positive_rate: 0.0,
		false_positive_rate: 0.0,
	}];
	for tps_fps_point in tps_fps.iter() {
		roc_curve.push(RocCurvePoint {
			threshold: tps_fps_point.threshold,
			true_positive_rate: tps_fps_point.true_positives as f32 / count_positives as f32,
			false_positive_rate: tps_fps_point.false_positives as f32 / count_negatives as f32,
		});
	}
	roc_curve
}

#[derive(Debug)]
struct TpsFpsPoint {
	/// The classification threshold.
	threshold: f32,
	/// The count of true positives at exactly this threshold.
	true_positives: usize,
	/// The count of false positives at exactly this threshold.
	false_positives: usize,
}

/// This function computes the counts of true positives and false positives at each distinct probability value. Unlike the roc curve, each point holds the counts at exactly this threshold rather than cumulative counts.
fn compute_tps_fps_by_threshold(probabilities: &[f32], labels: &[usize]) -> Vec<TpsFpsPoint> {
	let mut probabilities_labels: Vec<(f32, usize)> = probabilities
		.iter()
		.copied()
		.zip(labels.iter().copied())
		.collect();
	probabilities_labels
		.sort_by_key(|(probability, _)| Reverse(probability.to_finite().unwrap()));
	let mut tps_fps: Vec<TpsFpsPoint> = Vec::new();
	for (probability, label) in probabilities_labels {
		let true_positive = label.checked_sub(1).unwrap();
		// Predictions with the same probability share one threshold point.
		match tps_fps.last_mut() {
			Some(last_point) if probability == last_point.threshold => {
				last_point.true_positives += true_positive;
				last_point.false_positives += 1 - true_positive;
			}
			_ => {
				tps_fps.push(TpsFpsPoint {
					threshold: probability,
					true_positives: true_positive,
					false_positives: 1 - true_positive,
				});
			}
		}
	}
	tps_fps
}

#[test]
fn test_roc_curve() {
	let labels = vec![2, 2, 1, 1];
	let probabilities = vec![0.9, 0.4, 0.4, 0.2];
	let left = compute_roc_curve(probabilities.as_slice(), labels.as_slice());
	let right = vec![
		RocCurvePoint {
			threshold: 1.0,
			true_positive_rate: 0.0,
			false_positive_rate: 0.0,
		},
		RocCurvePoint {
			threshold: 0.9,
			true_positive_rate: 0.5,
			false_positive_rate: 0.0,
		},
		RocCurvePoint {
			threshold: 0.4,
			true_positive_rate: 1.0,
			false_positive_rate: 0.5,
		},
		RocCurvePoint {
			threshold: 0.2,
			true_positive_rate: 1.0,
			false_positive_rate: 1.0,
		},
	];
	assert_eq!(left, right);
	let auc = auc_roc(probabilities.as_slice(), labels.as_slice());
	assert!(f32::abs(auc - 0.875) < f32::EPSILON);
}

#[test]
fn test_auc_roc_perfect_separation() {
	let labels = vec![1, 1, 2, 2];
	let probabilities = vec![0.1, 0.2, 0.8, 0.9];
	let auc = auc_roc(probabilities.as_slice(), labels.as_slice());
	assert!(f32::abs(auc - 1.0) < f32::EPSILON);
}
