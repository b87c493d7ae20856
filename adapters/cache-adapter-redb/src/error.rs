//! Error types for the cache adapter

use std::fmt;

#[derive(Debug)]
pub enum Error {
	/// Database operation error
	DbError(String),

	/// I/O error
	IoError(String),
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Error::DbError(msg) => write!(f, "Database error: {}", msg),
			Error::IoError(msg) => write!(f, "I/O error: {}", msg),
		}
	}
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Error::IoError(err.to_string())
	}
}

impl From<Error> for canopy::error::Error {
	fn from(err: Error) -> Self {
		canopy::error::Error::CacheError(err.to_string())
	}
}

// vim: ts=4
