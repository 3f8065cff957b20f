use super::*;
use anyhow::Result;
use std::{
	collections::{BTreeMap, BTreeSet},
	path::Path,
};

#[derive(Clone)]
pub struct FromCsvOptions<'a> {
	/// Explicit types for columns whose type should not be inferred.
	pub column_types: Option<BTreeMap<String, ColumnType>>,
	pub infer_options: InferOptions,
	pub invalid_values: &'a [&'a str],
}

impl<'a> Default for FromCsvOptions<'a> {
	fn default() -> FromCsvOptions<'a> {
		FromCsvOptions {
			column_types: None,
			infer_options: InferOptions::default(),
			invalid_values: DEFAULT_INVALID_VALUES,
		}
	}
}

#[derive(Clone, Debug)]
pub struct InferOptions {
	pub enum_max_unique_values: usize,
}

impl Default for InferOptions {
	fn default() -> InferOptions {
		InferOptions {
			enum_max_unique_values: 100,
		}
	}
}

/// These values are the default values that are considered invalid.
const DEFAULT_INVALID_VALUES: &[&str] = &[
	"", "null", "NULL", "n/a", "N/A", "nan", "-nan", "NaN", "-NaN", "?",
];

impl DataFrame {
	pub fn from_path(
		path: &Path,
		options: FromCsvOptions,
		progress: impl Fn(u64),
	) -> Result<DataFrame> {
		DataFrame::from_csv(&mut csv::Reader::from_path(path)?, options, progress)
	}

	pub fn from_csv<R>(
		reader: &mut csv::Reader<R>,
		options: FromCsvOptions,
		progress: impl Fn(u64),
	) -> Result<DataFrame>
	where
		R: std::io::Read + std::io::Seek,
	{
		let column_names: Vec<String> = reader
			.headers()?
			.into_iter()
			.map(|column_name| column_name.to_owned())
			.collect();
		let start_position = reader.position().clone();

		#[derive(Clone, Debug)]
		enum ColumnTypeOrInferStats<'a> {
			ColumnType(ColumnType),
			InferStats(InferStats<'a>),
		}

		// Retrieve any column types present in the options. The types of the remaining columns are inferred.
		let mut column_types: Vec<ColumnTypeOrInferStats> = column_names
			.iter()
			.map(|column_name| {
				options
					.column_types
					.as_ref()
					.and_then(|column_types| column_types.get(column_name))
					.map(|column_type| ColumnTypeOrInferStats::ColumnType(column_type.clone()))
					.unwrap_or_else(|| {
						ColumnTypeOrInferStats::InferStats(InferStats::new(&options.infer_options))
					})
			})
			.collect();

		// Passing over the csv to infer column types is only necessary if one or more columns did not have its type specified.
		let needs_infer = column_types
			.iter()
			.any(|column_type| matches!(column_type, ColumnTypeOrInferStats::InferStats(_)));
		let mut n_rows = None;
		let column_types: Vec<ColumnType> = if needs_infer {
			let mut infer_stats: Vec<(usize, &mut InferStats)> = column_types
				.iter_mut()
				.enumerate()
				.filter_map(|(index, column_type)| match column_type {
					ColumnTypeOrInferStats::ColumnType(_) => None,
					ColumnTypeOrInferStats::InferStats(infer_stats) => Some((index, infer_stats)),
				})
				.collect();
			let mut record = csv::StringRecord::new();
			let mut n_rows_inferred = 0;
			while reader.read_record(&mut record)? {
				n_rows_inferred += 1;
				for (index, infer_stats) in infer_stats.iter_mut() {
					let value = record.get(*index).unwrap();
					infer_stats.update(value, options.invalid_values);
				}
			}
			n_rows = Some(n_rows_inferred);
			let column_types = column_types
				.into_iter()
				.map(|column_type| match column_type {
					ColumnTypeOrInferStats::ColumnType(column_type) => column_type,
					ColumnTypeOrInferStats::InferStats(infer_stats) => infer_stats.finalize(),
				})
				.collect();
			// After inference, return to the beginning of the csv to load the values.
			reader.seek(start_position)?;
			column_types
		} else {
			column_types
				.into_iter()
				.map(|column_type| match column_type {
					ColumnTypeOrInferStats::ColumnType(column_type) => column_type,
					ColumnTypeOrInferStats::InferStats(_) => unreachable!(),
				})
				.collect()
		};

		// Create the dataframe and reserve storage if the inference pass counted the rows.
		let mut dataframe = DataFrame::new(column_names, column_types);
		if let Some(n_rows) = n_rows {
			for column in dataframe.columns.iter_mut() {
				match column {
					Column::Number(column) => column.data.reserve_exact(n_rows),
					Column::Enum(column) => column.data.reserve_exact(n_rows),
					Column::Text(column) => column.data.reserve_exact(n_rows),
				}
			}
		}

		// Read each csv record and insert the values into the columns of the dataframe.
		let mut record = csv::ByteRecord::new();
		while reader.read_byte_record(&mut record)? {
			progress(record.position().unwrap().byte());
			for (column, value) in dataframe.columns.iter_mut().zip(record.iter()) {
				match column {
					Column::Number(column) => {
						let value = match lexical::parse::<f32, &[u8]>(value) {
							Ok(value) if value.is_finite() => value,
							_ => std::f32::NAN,
						};
						column.data.push(value);
					}
					Column::Enum(column) => {
						let value = std::str::from_utf8(value).ok().and_then(|value| {
							column
								.options
								.iter()
								.position(|option| option == value)
								.map(|position| NonZeroUsize::new(position + 1).unwrap())
						});
						column.data.push(value);
					}
					Column::Text(column) => {
						column.data.push(std::str::from_utf8(value)?.to_owned());
					}
				}
			}
		}
		Ok(dataframe)
	}
}

#[derive(Clone, Debug)]
struct InferStats<'a> {
	infer_options: &'a InferOptions,
	column_type: InferColumnType,
	unique_values: Option<BTreeSet<String>>,
}

#[derive(PartialEq, Clone, Copy, Debug)]
enum InferColumnType {
	Unknown,
	Number,
	Enum,
	Text,
}

impl<'a> InferStats<'a> {
	fn new(infer_options: &'a InferOptions) -> InferStats<'a> {
		InferStats {
			infer_options,
			column_type: InferColumnType::Unknown,
			unique_values: Some(BTreeSet::new()),
		}
	}

	fn update(&mut self, value: &str, invalid_values: &[&str]) {
		if invalid_values.contains(&value) {
			return;
		}
		if let Some(unique_values) = self.unique_values.as_mut() {
			if !unique_values.contains(value) {
				unique_values.insert(value.to_owned());
			}
			if unique_values.len() > self.infer_options.enum_max_unique_values {
				self.unique_values = None;
			}
		}
		match self.column_type {
			InferColumnType::Unknown | InferColumnType::Number => {
				if lexical::parse::<f32, &str>(value)
					.map(|value| value.is_finite())
					.unwrap_or(false)
				{
					self.column_type = InferColumnType::Number;
				} else if self.unique_values.is_some() {
					self.column_type = InferColumnType::Enum;
				} else {
					self.column_type = InferColumnType::Text;
				}
			}
			InferColumnType::Enum => {
				if self.unique_values.is_none() {
					self.column_type = InferColumnType::Text;
				}
			}
			_ => {}
		}
	}

	fn finalize(self) -> ColumnType {
		match self.column_type {
			InferColumnType::Unknown => ColumnType::Text,
			InferColumnType::Number => {
				// If all the values in a number column are 0/1 or -1/1 then make this an enum column instead, because such columns are binary labels. The -1/1 form is how credit risk datasets commonly encode the target.
				if let Some(unique_values) = self.unique_values {
					let is_binary = {
						let mut values = unique_values.iter().map(|value| value.as_str());
						let first = values.next();
						let second = values.next();
						let third = values.next();
						third.is_none()
							&& ((first == Some("0") && second == Some("1"))
								|| (first == Some("-1") && second == Some("1")))
					};
					if is_binary {
						return ColumnType::Enum {
							options: unique_values.into_iter().collect(),
						};
					}
				}
				ColumnType::Number
			}
			InferColumnType::Enum => ColumnType::Enum {
				options: self.unique_values.unwrap().into_iter().collect(),
			},
			InferColumnType::Text => ColumnType::Text,
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_infer() {
		let csv = "number,enum,text\n2.5,test,hello\n3.7,test,world\n";
		let dataframe = DataFrame::from_csv(
			&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
			FromCsvOptions {
				infer_options: InferOptions {
					enum_max_unique_values: 1,
				},
				..Default::default()
			},
			|_| {},
		)
		.unwrap();
		assert_eq!(
			dataframe.columns[0],
			Column::Number(NumberColumn {
				name: "number".to_owned(),
				data: vec![2.5, 3.7],
			})
		);
		assert_eq!(
			dataframe.columns[1],
			Column::Enum(EnumColumn {
				name: "enum".to_owned(),
				options: vec!["test".to_owned()],
				data: vec![NonZeroUsize::new(1), NonZeroUsize::new(1)],
			})
		);
		assert_eq!(
			dataframe.columns[2],
			Column::Text(TextColumn {
				name: "text".to_owned(),
				data: vec!["hello".to_owned(), "world".to_owned()],
			})
		);
	}

	#[test]
	fn test_infer_binary_target() {
		let csv = "value,target\n0.4,-1\n1.5,1\n2.1,1\n";
		let dataframe = DataFrame::from_csv(
			&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
			FromCsvOptions::default(),
			|_| {},
		)
		.unwrap();
		assert_eq!(
			dataframe.columns[0],
			Column::Number(NumberColumn {
				name: "value".to_owned(),
				data: vec![0.4, 1.5, 2.1],
			})
		);
		// The -1/1 column becomes an enum with the negative class as the first option.
		assert_eq!(
			dataframe.columns[1],
			Column::Enum(EnumColumn {
				name: "target".to_owned(),
				options: vec!["-1".to_owned(), "1".to_owned()],
				data: vec![
					NonZeroUsize::new(1),
					NonZeroUsize::new(2),
					NonZeroUsize::new(2),
				],
			})
		);
	}

	#[test]
	fn test_explicit_column_types() {
		let csv = "number,text\n1,test\n2,test\n";
		let mut column_types = BTreeMap::new();
		column_types.insert("text".to_owned(), ColumnType::Text);
		column_types.insert("number".to_owned(), ColumnType::Number);
		let dataframe = DataFrame::from_csv(
			&mut csv::Reader::from_reader(std::io::Cursor::new(csv)),
			FromCsvOptions {
				column_types: Some(column_types),
				..Default::default()
			},
			|_| {},
		)
		.unwrap();
		assert_eq!(
			dataframe.columns[0],
			Column::Number(NumberColumn {
				name: "number".to_owned(),
				data: vec![1.0, 2.0],
			})
		);
		assert_eq!(
			dataframe.columns[1],
			Column::Text(TextColumn {
				name: "text".to_owned(),
				data: vec!["test".to_owned(), "test".to_owned()],
			})
		);
	}
}
