use num_traits::Float;
use std::cmp::Ordering;
use thiserror::Error;

/// A floating point value that is known to be finite, which means it can implement `Ord` and be sorted.
#[derive(Clone, Copy, Debug)]
pub struct Finite<T>(T)
where
	T: Float;

#[derive(Debug, Error)]
#[error("not finite")]
pub struct NotFiniteError;

impl<T> Finite<T>
where
	T: Float,
{
	pub fn new(value: T) -> Result<Finite<T>, NotFiniteError> {
		if value.is_finite() {
			Ok(Finite(value))
		} else {
			Err(NotFiniteError)
		}
	}

	pub fn get(self) -> T {
		self.0
	}
}

impl<T> PartialEq for Finite<T>
where
	T: Float,
{
	fn eq(&self, other: &Self) -> bool {
		self.0.eq(&other.0)
	}
}

impl<T> Eq for Finite<T> where T: Float {}

impl<T> PartialOrd for Finite<T>
where
	T: Float,
{
	fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
		self.0.partial_cmp(&other.0)
	}
}

impl<T> Ord for Finite<T>
where
	T: Float,
{
	fn cmp(&self, other: &Self) -> Ordering {
		self.0.partial_cmp(&other.0).unwrap()
	}
}

pub trait ToFinite<T>
where
	T: Float,
{
	fn to_finite(self) -> Result<Finite<T>, NotFiniteError>;
}

impl<T> ToFinite<T> for T
where
	T: Float,
{
	fn to_finite(self) -> Result<Finite<T>, NotFiniteError> {
		Finite::new(self)
	}
}

#[test]
fn test_finite() {
	assert!(Finite::new(1.0f32).is_ok());
	assert!(Finite::new(std::f32::NAN).is_err());
	assert!(Finite::new(std::f32::INFINITY).is_err());
	let mut values = vec![
		Finite::new(0.3f32).unwrap(),
		Finite::new(0.1).unwrap(),
		Finite::new(0.2).unwrap(),
	];
	values.sort();
	assert_eq!(values[0].get(), 0.1);
	assert_eq!(values[2].get(), 0.3);
}
