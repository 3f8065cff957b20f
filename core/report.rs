use crate::compare::{CompareOutput, VariantOutput};
use anyhow::{Context, Result};
use std::path::Path;

/// The serializable form of a comparison run, written to `report.json`. The roc curve points take the place of the AUC plot.
#[derive(serde::Serialize)]
pub struct Report {
	pub variants: Vec<VariantReport>,
}

#[derive(serde::Serialize)]
pub struct VariantReport {
	pub variant: String,
	pub accuracy: f32,
	pub precision: f32,
	pub recall: f32,
	pub f1_score: f32,
	pub auc_roc: f32,
	pub true_positives: u64,
	pub false_positives: u64,
	pub true_negatives: u64,
	pub false_negatives: u64,
	pub roc_curve: Vec<RocCurvePointReport>,
}

#[derive(serde::Serialize)]
pub struct RocCurvePointReport {
	pub threshold: f32,
	pub true_positive_rate: f32,
	pub false_positive_rate: f32,
}

impl From<&CompareOutput> for Report {
	fn from(output: &CompareOutput) -> Report {
		Report {
			variants: output.variants.iter().map(Into::into).collect(),
		}
	}
}

impl From<&VariantOutput> for VariantReport {
	fn from(output: &VariantOutput) -> VariantReport {
		VariantReport {
			variant: output.variant.to_string(),
			accuracy: output.metrics.accuracy,
			precision: output.metrics.precision,
			recall: output.metrics.recall,
			f1_score: output.metrics.f1_score,
			auc_roc: output.auc_roc,
			true_positives: output.metrics.true_positives,
			false_positives: output.metrics.false_positives,
			true_negatives: output.metrics.true_negatives,
			false_negatives: output.metrics.false_negatives,
			roc_curve: output
				.roc_curve
				.iter()
				.map(|point| RocCurvePointReport {
					threshold: point.threshold,
					true_positive_rate: point.true_positive_rate,
					false_positive_rate: point.false_positive_rate,
				})
				.collect(),
		}
	}
}

/// Write the comparison report as json into `path`.
pub fn write_report(output: &CompareOutput, path: &Path) -> Result<()> {
	let report = Report::from(output);
	let file = std::fs::File::create(path)
		.with_context(|| format!("failed to create report file {}", path.display()))?;
	serde_json::to_writer_pretty(file, &report)
		.with_context(|| format!("failed to write report file {}", path.display()))?;
	Ok(())
}

#[cfg(test)]
mod test {
	use super::*;
	use crate::compare::{PreprocessSummary, VariantOutput};
	use crate::config::Variant;
	use subscale_metrics::BinaryClassificationMetricsOutput;

	#[test]
	fn test_report_from_output() {
		let output = CompareOutput {
			summary: PreprocessSummary {
				n_rows: 10,
				n_rows_train: 7,
				n_rows_test: 3,
				n_variables: 1,
				n_binned_variables: 1,
				n_unbinned_variables: 0,
				subscales: Vec::new(),
			},
			variants: vec![VariantOutput {
				variant: Variant::Linear,
				metrics: BinaryClassificationMetricsOutput {
					threshold: 0.5,
					true_positives: 2,
					false_positives: 0,
					true_negatives: 1,
					false_negatives: 0,
					accuracy: 1.0,
					precision: 1.0,
					recall: 1.0,
					f1_score: 1.0,
				},
				auc_roc: 1.0,
				roc_curve: Vec::new(),
				model_summary: None,
			}],
		};
		let report = Report::from(&output);
		let json = serde_json::to_string(&report).unwrap();
		assert!(json.contains("\"variant\":\"logistic regression\""));
		assert!(json.contains("\"auc_roc\":1.0"));
	}
}
