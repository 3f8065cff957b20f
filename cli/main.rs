//! This module contains the main entrypoint to the subscale cli.

use self::progress_view::ProgressView;
use anyhow::{Context, Result};
use clap::Clap;
use colored::Colorize;
use std::path::PathBuf;
use subscale_core::{PreprocessSummary, VariantOutput};

mod progress_view;

#[derive(Clap)]
#[clap(
	about = "Compare two layer risk scoring architectures on a tabular dataset.",
	setting = clap::AppSettings::DisableHelpSubcommand,
)]
enum Options {
	#[clap(name = "compare")]
	Compare(Box<CompareOptions>),
}

#[derive(Clap, Debug)]
#[clap(about = "run the comparison")]
#[clap(
	long_about = "run the selected model architectures over one shared train/test split and report accuracy, precision, recall, F1, and AUC for each"
)]
struct CompareOptions {
	#[clap(short, long, about = "the path to your .csv dataset file")]
	file: PathBuf,
	#[clap(short, long, about = "the name of the column to predict")]
	target: String,
	#[clap(short, long, about = "the path to a config file")]
	config: Option<PathBuf>,
	#[clap(short, long, about = "the path to the interval breakpoints .csv file")]
	breakpoints: PathBuf,
	#[clap(long, about = "the path to a per-variable coefficient bounds .csv file")]
	bounds: Option<PathBuf>,
	#[clap(short, long, about = "the directory to write the report to")]
	output: Option<PathBuf>,
	#[clap(long = "no-progress", about = "disable the progress output", parse(from_flag = std::ops::Not::not))]
	progress: bool,
}

fn main() {
	let options = Options::parse();
	let result = match options {
		Options::Compare(options) => cli_compare(*options),
	};
	if let Err(error) = result {
		eprintln!("{}: {:#}", "error".red().bold(), error);
		std::process::exit(1);
	}
}

fn cli_compare(options: CompareOptions) -> Result<()> {
	let mut progress_view = if options.progress {
		Some(ProgressView::new())
	} else {
		None
	};
	let output = subscale_core::compare(
		&options.file,
		&options.target,
		options.config.as_deref(),
		&options.breakpoints,
		options.bounds.as_deref(),
		&mut |progress| {
			if let Some(progress_view) = progress_view.as_mut() {
				progress_view.update(progress);
			}
		},
	)?;

	print_summary(&output.summary);
	for variant_output in output.variants.iter() {
		print_variant(variant_output);
	}

	if let Some(output_dir) = options.output {
		std::fs::create_dir_all(&output_dir).with_context(|| {
			format!("failed to create output directory {}", output_dir.display())
		})?;
		let report_path = output_dir.join("report.json");
		subscale_core::write_report(&output, &report_path)?;
		eprintln!("The report was written to {}.", report_path.display());
	}

	Ok(())
}

fn print_summary(summary: &PreprocessSummary) {
	println!("{}", "## Dataset".bold());
	println!(
		"{} rows, {} train / {} test",
		summary.n_rows, summary.n_rows_train, summary.n_rows_test
	);
	println!(
		"{} variables: {} binned, {} passed through",
		summary.n_variables, summary.n_binned_variables, summary.n_unbinned_variables
	);
	for subscale in summary.subscales.iter() {
		println!(
			"  {}: {} features ({})",
			subscale.name,
			subscale.n_features,
			subscale.variable_names.join(", ")
		);
	}
	println!();
}

fn print_variant(output: &VariantOutput) {
	println!("{}", format!("## {}", output.variant).bold());
	println!("accuracy  {:.4}", output.metrics.accuracy);
	println!("precision {:.4}", output.metrics.precision);
	println!("recall    {:.4}", output.metrics.recall);
	println!("f1        {:.4}", output.metrics.f1_score);
	println!("auc       {:.4}", output.auc_roc);
	if let Some(model_summary) = output.model_summary.as_ref() {
		println!();
		println!("{}", model_summary);
	}
	println!();
}
