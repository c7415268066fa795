use std::path::PathBuf;

use thiserror::Error;

/// Failures of the state and session stores.
///
/// A missing file is never an error; stores start fresh instead. A quota
/// denial is not an error either, see [`crate::Admission`].
#[derive(Debug, Error)]
pub enum StoreError {
	#[error("{} is not a valid {kind} file{}: {source}", path.display(), backup_note(backup))]
	Format {
		kind: &'static str,
		path: PathBuf,
		backup: Option<PathBuf>,
		#[source]
		source: serde_json::Error,
	},

	#[error("I/O error on {}: {source}", path.display())]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("failed to encode {kind} file: {source}")]
	Serialize {
		kind: &'static str,
		#[source]
		source: serde_json::Error,
	},
}

fn backup_note(backup: &Option<PathBuf>) -> String {
	match backup {
		Some(path) => format!(" (copy kept at {})", path.display()),
		None => String::new(),
	}
}

impl StoreError {
	pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
		StoreError::Io {
			path: path.into(),
			source,
		}
	}

	/// Returns true for an unparseable file.
	pub fn is_format(&self) -> bool {
		matches!(self, StoreError::Format { .. })
	}
}

pub type Result<T> = std::result::Result<T, StoreError>;
