/*!
This crate provides a basic implementation of dataframes, which are two dimensional arrays of data where each column can have a different data type, like a spreadsheet. It implements only the features needed by the model comparison pipeline: loading from csv, borrowing views, splitting by row, and converting to a dense `ndarray` of `f32`s.
*/

use itertools::izip;
use ndarray::prelude::*;
use num_traits::ToPrimitive;
use std::num::NonZeroUsize;

pub mod load;

pub use self::load::*;

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrame {
	pub columns: Vec<Column>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
	Number(NumberColumn),
	Enum(EnumColumn),
	Text(TextColumn),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberColumn {
	pub name: String,
	pub data: Vec<f32>,
}

/// An `EnumColumn` holds values from a fixed set of options. Values index into `options` 1-based, and `None` marks a value that was not one of the options.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumColumn {
	pub name: String,
	pub options: Vec<String>,
	pub data: Vec<Option<NonZeroUsize>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextColumn {
	pub name: String,
	pub data: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DataFrameView<'a> {
	pub columns: Vec<ColumnView<'a>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ColumnView<'a> {
	Number(NumberColumnView<'a>),
	Enum(EnumColumnView<'a>),
	Text(TextColumnView<'a>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NumberColumnView<'a> {
	pub name: &'a str,
	pub data: &'a [f32],
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumColumnView<'a> {
	pub name: &'a str,
	pub options: &'a [String],
	pub data: &'a [Option<NonZeroUsize>],
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextColumnView<'a> {
	pub name: &'a str,
	pub data: &'a [String],
}

#[derive(Debug, Clone)]
pub enum ColumnType {
	Number,
	Enum { options: Vec<String> },
	Text,
}

impl DataFrame {
	pub fn new(column_names: Vec<String>, column_types: Vec<ColumnType>) -> DataFrame {
		let columns = column_names
			.into_iter()
			.zip(column_types.into_iter())
			.map(|(column_name, column_type)| match column_type {
				ColumnType::Number => Column::Number(NumberColumn::new(column_name)),
				ColumnType::Enum { options } => Column::Enum(EnumColumn::new(column_name, options)),
				ColumnType::Text => Column::Text(TextColumn::new(column_name)),
			})
			.collect();
		DataFrame { columns }
	}

	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn view(&self) -> DataFrameView {
		let columns = self.columns.iter().map(|column| column.view()).collect();
		DataFrameView { columns }
	}

	pub fn column(&self, name: &str) -> Option<&Column> {
		self.columns.iter().find(|column| column.name() == name)
	}
}

impl Column {
	pub fn len(&self) -> usize {
		match self {
			Column::Number(column) => column.data.len(),
			Column::Enum(column) => column.data.len(),
			Column::Text(column) => column.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn name(&self) -> &str {
		match self {
			Column::Number(column) => column.name.as_str(),
			Column::Enum(column) => column.name.as_str(),
			Column::Text(column) => column.name.as_str(),
		}
	}

	pub fn as_number(&self) -> Option<&NumberColumn> {
		match self {
			Column::Number(column) => Some(column),
			_ => None,
		}
	}

	pub fn as_enum(&self) -> Option<&EnumColumn> {
		match self {
			Column::Enum(column) => Some(column),
			_ => None,
		}
	}

	pub fn as_text(&self) -> Option<&TextColumn> {
		match self {
			Column::Text(column) => Some(column),
			_ => None,
		}
	}

	pub fn view(&self) -> ColumnView {
		match self {
			Column::Number(column) => ColumnView::Number(column.view()),
			Column::Enum(column) => ColumnView::Enum(column.view()),
			Column::Text(column) => ColumnView::Text(column.view()),
		}
	}
}

impl NumberColumn {
	pub fn new(name: String) -> NumberColumn {
		NumberColumn {
			name,
			data: Vec::new(),
		}
	}

	pub fn view(&self) -> NumberColumnView {
		NumberColumnView {
			name: &self.name,
			data: &self.data,
		}
	}
}

impl EnumColumn {
	pub fn new(name: String, options: Vec<String>) -> EnumColumn {
		EnumColumn {
			name,
			options,
			data: Vec::new(),
		}
	}

	pub fn view(&self) -> EnumColumnView {
		EnumColumnView {
			name: &self.name,
			options: &self.options,
			data: &self.data,
		}
	}
}

impl TextColumn {
	pub fn new(name: String) -> TextColumn {
		TextColumn {
			name,
			data: Vec::new(),
		}
	}

	pub fn view(&self) -> TextColumnView {
		TextColumnView {
			name: &self.name,
			data: &self.data,
		}
	}
}

impl<'a> DataFrameView<'a> {
	pub fn ncols(&self) -> usize {
		self.columns.len()
	}

	pub fn nrows(&self) -> usize {
		self.columns.first().map(|column| column.len()).unwrap_or(0)
	}

	pub fn column(&self, name: &str) -> Option<&ColumnView<'a>> {
		self.columns.iter().find(|column| column.name() == name)
	}

	/// Split the view into the first `index` rows and the remaining rows, without copying any data.
	pub fn split_at_row(&self, index: usize) -> (DataFrameView<'a>, DataFrameView<'a>) {
		let iter = self.columns.iter().map(|column| column.split_at_row(index));
		let mut columns_a = Vec::with_capacity(self.columns.len());
		let mut columns_b = Vec::with_capacity(self.columns.len());
		for (column_a, column_b) in iter {
			columns_a.push(column_a);
			columns_b.push(column_b);
		}
		(
			DataFrameView { columns: columns_a },
			DataFrameView { columns: columns_b },
		)
	}

	/// Convert the view to a dense array with one row per example, or `None` if any column is a text column.
	pub fn to_rows_f32(&self) -> Option<Array2<f32>> {
		let mut rows = Array::zeros((self.nrows(), self.ncols()));
		for (mut array_column, dataframe_column) in
			izip!(rows.gencolumns_mut(), self.columns.iter())
		{
			match dataframe_column {
				ColumnView::Number(column) => {
					for (a, b) in izip!(array_column.iter_mut(), column.data) {
						*a = *b;
					}
				}
				ColumnView::Enum(column) => {
					for (a, b) in izip!(array_column.iter_mut(), column.data) {
						*a = b.map(|b| b.get()).unwrap_or(0).to_f32().unwrap();
					}
				}
				ColumnView::Text(_) => return None,
			}
		}
		Some(rows)
	}
}

impl<'a> ColumnView<'a> {
	pub fn len(&self) -> usize {
		match self {
			ColumnView::Number(column) => column.data.len(),
			ColumnView::Enum(column) => column.data.len(),
			ColumnView::Text(column) => column.data.len(),
		}
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	pub fn name(&self) -> &str {
		match self {
			ColumnView::Number(column) => column.name,
			ColumnView::Enum(column) => column.name,
			ColumnView::Text(column) => column.name,
		}
	}

	pub fn as_number(&self) -> Option<&NumberColumnView<'a>> {
		match self {
			ColumnView::Number(column) => Some(column),
			_ => None,
		}
	}

	pub fn as_enum(&self) -> Option<&EnumColumnView<'a>> {
		match self {
			ColumnView::Enum(column) => Some(column),
			_ => None,
		}
	}

	pub fn as_text(&self) -> Option<&TextColumnView<'a>> {
		match self {
			ColumnView::Text(column) => Some(column),
			_ => None,
		}
	}

	pub fn split_at_row(&self, index: usize) -> (ColumnView<'a>, ColumnView<'a>) {
		match self {
			ColumnView::Number(column) => {
				let (data_a, data_b) = column.data.split_at(index);
				(
					ColumnView::Number(NumberColumnView {
						name: column.name,
						data: data_a,
					}),
					ColumnView::Number(NumberColumnView {
						name: column.name,
						data: data_b,
					}),
				)
			}
			ColumnView::Enum(column) => {
				let (data_a, data_b) = column.data.split_at(index);
				(
					ColumnView::Enum(EnumColumnView {
						name: column.name,
						options: column.options,
						data: data_a,
					}),
					ColumnView::Enum(EnumColumnView {
						name: column.name,
						options: column.options,
						data: data_b,
					}),
				)
			}
			ColumnView::Text(column) => {
				let (data_a, data_b) = column.data.split_at(index);
				(
					ColumnView::Text(TextColumnView {
						name: column.name,
						data: data_a,
					}),
					ColumnView::Text(TextColumnView {
						name: column.name,
						data: data_b,
					}),
				)
			}
		}
	}
}

#[test]
fn test_split_at_row() {
	let dataframe = DataFrame {
		columns: vec![
			Column::Number(NumberColumn {
				name: "a".to_owned(),
				data: vec![1.0, 2.0, 3.0, 4.0],
			}),
			Column::Number(NumberColumn {
				name: "b".to_owned(),
				data: vec![5.0, 6.0, 7.0, 8.0],
			}),
		],
	};
	let view = dataframe.view();
	let (left, right) = view.split_at_row(3);
	assert_eq!(left.nrows(), 3);
	assert_eq!(right.nrows(), 1);
	assert_eq!(left.column("a").unwrap().as_number().unwrap().data, &[
		1.0, 2.0, 3.0
	]);
	assert_eq!(right.column("b").unwrap().as_number().unwrap().data, &[8.0]);
}

#[test]
fn test_to_rows_f32() {
	let dataframe = DataFrame {
		columns: vec![
			Column::Number(NumberColumn {
				name: "a".to_owned(),
				data: vec![1.0, 2.0],
			}),
			Column::Number(NumberColumn {
				name: "b".to_owned(),
				data: vec![3.0, 4.0],
			}),
		],
	};
	let rows = dataframe.view().to_rows_f32().unwrap();
	assert_eq!(rows, ndarray::arr2(&[[1.0, 3.0], [2.0, 4.0]]));
}
