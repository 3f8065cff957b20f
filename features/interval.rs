use anyhow::{format_err, Result};

/**
An `Interval` is one bin of a binned variable, written `(lower, upper]`. A bound of `None` means the interval is unbounded on that side, which breakpoint strings write as `-INF` or `+INF`:

```text
(-INF, 63.0]
(63.0, 71.0]
(71.0, +INF)
```

The lower bound is always exclusive and the upper bound is always inclusive, so consecutive intervals tile the number line without overlap.
*/
#[derive(Clone, Debug, PartialEq)]
pub struct Interval {
	pub lower: Option<f32>,
	pub upper: Option<f32>,
}

impl Interval {
	/// Parse a breakpoint string of the form `"(lower, upper]"`, where either bound may be `-INF` or `+INF`.
	pub fn parse(value: &str) -> Result<Interval> {
		let value = value.trim();
		let invalid = || format_err!("invalid interval {:?}", value);
		let inner = value
			.strip_prefix('(')
			.ok_or_else(invalid)?
			.strip_suffix(|c| c == ']' || c == ')')
			.ok_or_else(invalid)?;
		let comma_index = inner.find(',').ok_or_else(invalid)?;
		let lower = Interval::parse_bound(&inner[..comma_index]).map_err(|_| invalid())?;
		let upper = Interval::parse_bound(&inner[comma_index + 1..]).map_err(|_| invalid())?;
		Ok(Interval { lower, upper })
	}

	fn parse_bound(token: &str) -> Result<Option<f32>> {
		let token = token.trim();
		match token {
			"-INF" | "+INF" | "INF" => Ok(None),
			_ => {
				let value: f32 = token
					.parse()
					.map_err(|_| format_err!("invalid bound {:?}", token))?;
				Ok(Some(value))
			}
		}
	}

	/// Whether `value` falls in this interval. `NaN` falls in no interval.
	pub fn contains(&self, value: f32) -> bool {
		match (self.lower, self.upper) {
			(None, Some(upper)) => value <= upper,
			(Some(lower), Some(upper)) => value > lower && value <= upper,
			(Some(lower), None) => value > lower,
			(None, None) => !value.is_nan(),
		}
	}
}

impl std::fmt::Display for Interval {
	fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
		match self.lower {
			Some(lower) => write!(f, "({}, ", lower)?,
			None => write!(f, "(-INF, ")?,
		}
		match self.upper {
			Some(upper) => write!(f, "{}]", upper),
			None => write!(f, "+INF)"),
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn test_parse() {
		assert_eq!(
			Interval::parse("(-INF, 63.0]").unwrap(),
			Interval {
				lower: None,
				upper: Some(63.0),
			}
		);
		assert_eq!(
			Interval::parse("(63.0, 71.0]").unwrap(),
			Interval {
				lower: Some(63.0),
				upper: Some(71.0),
			}
		);
		assert_eq!(
			Interval::parse("(71.0, +INF)").unwrap(),
			Interval {
				lower: Some(71.0),
				upper: None,
			}
		);
		assert!(Interval::parse("63.0, 71.0").is_err());
		assert!(Interval::parse("(63.0; 71.0]").is_err());
		assert!(Interval::parse("(a, b]").is_err());
	}

	#[test]
	fn test_display() {
		assert_eq!(
			Interval::parse("(-INF, 63.0]").unwrap().to_string(),
			"(-INF, 63]"
		);
		assert_eq!(
			Interval::parse("(63.5, 71.0]").unwrap().to_string(),
			"(63.5, 71]"
		);
		assert_eq!(
			Interval::parse("(71.0, +INF)").unwrap().to_string(),
			"(71, +INF)"
		);
	}

	#[test]
	fn test_contains() {
		let first = Interval::parse("(-INF, 63.0]").unwrap();
		assert!(first.contains(-100.0));
		assert!(first.contains(63.0));
		assert!(!first.contains(63.5));
		let middle = Interval::parse("(63.0, 71.0]").unwrap();
		assert!(!middle.contains(63.0));
		assert!(middle.contains(63.5));
		assert!(middle.contains(71.0));
		assert!(!middle.contains(71.5));
		let last = Interval::parse("(71.0, +INF)").unwrap();
		assert!(!last.contains(71.0));
		assert!(last.contains(1e9));
		assert!(!middle.contains(std::f32::NAN));
		assert!(!first.contains(std::f32::NAN));
		assert!(!last.contains(std::f32::NAN));
	}
}
