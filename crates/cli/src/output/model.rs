use serde::Serialize;

use super::OutputFormat;

/// Current schema version for command output.
pub const SCHEMA_VERSION: u32 = 1;

/// The result envelope printed by every command in JSON mode.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandResult<T: Serialize> {
	pub schema_version: u32,
	pub ok: bool,
	pub command: &'static str,
	pub data: T,
}

impl<T: Serialize> CommandResult<T> {
	pub fn success(command: &'static str, data: T) -> Self {
		Self {
			schema_version: SCHEMA_VERSION,
			ok: true,
			command,
			data,
		}
	}
}

/// Prints `data` as a JSON envelope, or the text rendering produced by `text`.
pub fn emit<T: Serialize>(format: OutputFormat, command: &'static str, data: &T, text: impl FnOnce(&T) -> String) -> anyhow::Result<()> {
	match format {
		OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&CommandResult::success(command, data))?),
		OutputFormat::Text => println!("{}", text(data)),
	}
	Ok(())
}
