//! File helpers shared by the state and session stores.
//!
//! Every file is opened, read or written, and closed within a single call.
//! Writes go through a temp file in the target directory and a rename, so a
//! crash mid-write leaves either the old or the new content on disk.

use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use tracing::{error, warn};

use crate::error::{Result, StoreError};

/// Atomically write `data` to `path` using a tempfile in the same directory.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
	let dir = match path.parent() {
		Some(parent) if !parent.as_os_str().is_empty() => parent,
		_ => Path::new("."),
	};
	fs::create_dir_all(dir).map_err(|e| StoreError::io(dir, e))?;

	let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
	tmp.write_all(data).map_err(|e| StoreError::io(tmp.path(), e))?;
	tmp.as_file().sync_all().map_err(|e| StoreError::io(tmp.path(), e))?;
	tmp.persist(path).map_err(|e| StoreError::io(path, e.error))?;
	Ok(())
}

/// Reads the raw bytes of `path`, mapping "not found" to `None`.
///
/// Content is not checked here; invalid UTF-8 surfaces as a decode error in
/// [`read_json`].
pub fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
	match fs::read(path) {
		Ok(content) => Ok(Some(content)),
		Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
		Err(err) => Err(StoreError::io(path, err)),
	}
}

/// Reads and decodes a JSON file.
///
/// Returns `Ok(None)` when the file does not exist. When it exists but does not
/// decode as `T`, a copy is kept next to it (see [`quarantine_copy`]) and a
/// [`StoreError::Format`] is returned. The original file is left in place.
pub fn read_json<T: DeserializeOwned>(path: &Path, kind: &'static str) -> Result<Option<T>> {
	let Some(content) = read_optional(path)? else {
		return Ok(None);
	};

	match serde_json::from_slice(&content) {
		Ok(value) => Ok(Some(value)),
		Err(source) => {
			let backup = quarantine_copy(path);
			error!(
				target = "outreach.io",
				path = %path.display(),
				backup = ?backup,
				error = %source,
				"refusing to use unparseable {kind} file"
			);
			Err(StoreError::Format {
				kind,
				path: path.to_path_buf(),
				backup,
				source,
			})
		}
	}
}

/// Encodes `value` as pretty JSON and writes it atomically.
pub fn write_json<T: Serialize>(path: &Path, kind: &'static str, value: &T) -> Result<()> {
	let json = serde_json::to_string_pretty(value).map_err(|source| StoreError::Serialize { kind, source })?;
	atomic_write(path, json.as_bytes())
}

/// Copies `path` to `<file>.corrupt-<unix-ts>` beside it.
///
/// Best effort: a failed copy is logged and reported as `None`.
pub fn quarantine_copy(path: &Path) -> Option<PathBuf> {
	let file_name = path.file_name()?.to_string_lossy().to_string();
	let backup = path.with_file_name(format!("{file_name}.corrupt-{}", Utc::now().timestamp()));
	match fs::copy(path, &backup) {
		Ok(_) => Some(backup),
		Err(err) => {
			warn!(
				target = "outreach.io",
				path = %path.display(),
				error = %err,
				"could not keep a copy of the unparseable file"
			);
			None
		}
	}
}

/// Removes `path`. Returns `false` when it did not exist.
pub fn remove_if_exists(path: &Path) -> Result<bool> {
	match fs::remove_file(path) {
		Ok(()) => Ok(true),
		Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
		Err(err) => Err(StoreError::io(path, err)),
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn atomic_write_creates_parents() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("a/b/state.json");
		atomic_write(&path, b"{}").unwrap();
		assert_eq!(fs::read_to_string(&path).unwrap(), "{}");
	}

	#[test]
	fn atomic_write_replaces_and_leaves_no_temp_files() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("state.json");
		atomic_write(&path, b"first").unwrap();
		atomic_write(&path, b"second").unwrap();

		assert_eq!(fs::read_to_string(&path).unwrap(), "second");
		let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().collect();
		assert_eq!(entries.len(), 1);
	}

	#[test]
	fn read_optional_maps_missing_to_none() {
		let dir = TempDir::new().unwrap();
		assert!(read_optional(&dir.path().join("nope.json")).unwrap().is_none());
	}

	#[test]
	fn read_json_keeps_original_and_copies_bad_file() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("cookies.json");
		fs::write(&path, "{not json").unwrap();

		let err = read_json::<Vec<u32>>(&path, "session").unwrap_err();
		let StoreError::Format { backup, .. } = &err else {
			panic!("expected format error, got {err:?}");
		};
		let backup = backup.as_ref().expect("backup copy should be written");

		assert_eq!(fs::read_to_string(&path).unwrap(), "{not json");
		assert_eq!(fs::read_to_string(backup).unwrap(), "{not json");
		assert!(err.to_string().contains("copy kept at"));
	}

	#[test]
	fn read_json_treats_invalid_utf8_as_unparseable() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("state.json");
		fs::write(&path, b"\xff\xfe{}").unwrap();

		let err = read_json::<serde_json::Value>(&path, "state").unwrap_err();
		let StoreError::Format { backup: Some(backup), .. } = &err else {
			panic!("expected format error with a copy, got {err:?}");
		};
		assert_eq!(fs::read(backup).unwrap(), b"\xff\xfe{}");
		assert_eq!(fs::read(&path).unwrap(), b"\xff\xfe{}");
	}

	#[test]
	fn remove_if_exists_reports_presence() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("cookies.json");
		fs::write(&path, "[]").unwrap();
		assert!(remove_if_exists(&path).unwrap());
		assert!(!remove_if_exists(&path).unwrap());
	}
}
