use anyhow::{Context, Result};
use std::path::Path;
use subscale_features::Interval;

/**
The `BinningSpec` holds the interval breakpoints of every binned variable, loaded from a csv with `var_name,split_list` columns. Consecutive rows with the same `var_name` are that variable's intervals, in order:

```text
var_name,split_list
ExternalRiskEstimate,"(-INF, 63.0]"
ExternalRiskEstimate,"(63.0, 71.0]"
ExternalRiskEstimate,"(71.0, +INF)"
```

Variables that do not appear in the file are not binned.
*/
#[derive(Debug)]
pub struct BinningSpec {
	entries: Vec<BinningSpecEntry>,
}

#[derive(Debug)]
struct BinningSpecEntry {
	variable_name: String,
	intervals: Vec<Interval>,
}

#[derive(Debug, serde::Deserialize)]
struct BinningRow {
	var_name: String,
	split_list: String,
}

impl BinningSpec {
	pub fn from_path(path: &Path) -> Result<BinningSpec> {
		let mut reader = csv::Reader::from_path(path)
			.with_context(|| format!("failed to read breakpoints file {}", path.display()))?;
		BinningSpec::from_reader(&mut reader)
	}

	pub fn from_reader<R>(reader: &mut csv::Reader<R>) -> Result<BinningSpec>
	where
		R: std::io::Read,
	{
		let mut entries: Vec<BinningSpecEntry> = Vec::new();
		for row in reader.deserialize() {
			let row: BinningRow = row.context("invalid row in breakpoints file")?;
			let interval = Interval::parse(&row.split_list).with_context(|| {
				format!("invalid breakpoint for variable \"{}\"", row.var_name)
			})?;
			match entries.last_mut() {
				Some(entry) if entry.variable_name == row.var_name => {
					entry.intervals.push(interval)
				}
				_ => entries.push(BinningSpecEntry {
					variable_name: row.var_name,
					intervals: vec![interval],
				}),
			}
		}
		Ok(BinningSpec { entries })
	}

	pub fn get(&self, variable_name: &str) -> Option<&[Interval]> {
		self.entries
			.iter()
			.find(|entry| entry.variable_name == variable_name)
			.map(|entry| entry.intervals.as_slice())
	}

	pub fn contains(&self, variable_name: &str) -> bool {
		self.get(variable_name).is_some()
	}

	pub fn n_variables(&self) -> usize {
		self.entries.len()
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_from_reader() {
		let csv = concat!(
			"var_name,split_list\n",
			"ExternalRiskEstimate,\"(-INF, 63.0]\"\n",
			"ExternalRiskEstimate,\"(63.0, 71.0]\"\n",
			"ExternalRiskEstimate,\"(71.0, +INF)\"\n",
			"MSinceOldestTradeOpen,\"(-INF, 120.0]\"\n",
			"MSinceOldestTradeOpen,\"(120.0, +INF)\"\n",
		);
		let spec =
			BinningSpec::from_reader(&mut csv::Reader::from_reader(std::io::Cursor::new(csv)))
				.unwrap();
		assert_eq!(spec.n_variables(), 2);
		assert_eq!(spec.get("ExternalRiskEstimate").unwrap().len(), 3);
		assert_eq!(spec.get("MSinceOldestTradeOpen").unwrap().len(), 2);
		assert!(!spec.contains("NetFractionRevolvingBurden"));
		assert_eq!(
			spec.get("ExternalRiskEstimate").unwrap()[1],
			Interval {
				lower: Some(63.0),
				upper: Some(71.0),
			}
		);
	}

	#[test]
	fn test_invalid_breakpoint() {
		let csv = "var_name,split_list\nExternalRiskEstimate,not an interval\n";
		let error =
			BinningSpec::from_reader(&mut csv::Reader::from_reader(std::io::Cursor::new(csv)))
				.unwrap_err();
		assert!(error.to_string().contains("ExternalRiskEstimate"));
	}
}
