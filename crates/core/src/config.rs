//! Run configuration.

use std::path::PathBuf;

pub const DEFAULT_STATE_FILE: &str = "state.json";
pub const DEFAULT_SESSION_FILE: &str = "cookies.json";
pub const DEFAULT_DAILY_CONNECTION_LIMIT: u32 = 20;
pub const DEFAULT_CONNECTION_NOTE: &str = "Hi, would love to connect!";
pub const DEFAULT_FOLLOW_UP_MESSAGE: &str = "Thanks for connecting! Looking forward to learning from you.";

/// Settings for one outreach run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
	pub state_file: PathBuf,
	pub session_file: PathBuf,
	pub daily_connection_limit: u32,
	/// `None` leaves follow-up messages ungated.
	pub daily_message_limit: Option<u32>,
	/// Note attached to connection requests. `None` sends without a note.
	pub connection_note: Option<String>,
	pub follow_up_message: String,
}

impl Default for RunConfig {
	fn default() -> Self {
		Self {
			state_file: PathBuf::from(DEFAULT_STATE_FILE),
			session_file: PathBuf::from(DEFAULT_SESSION_FILE),
			daily_connection_limit: DEFAULT_DAILY_CONNECTION_LIMIT,
			daily_message_limit: None,
			connection_note: Some(DEFAULT_CONNECTION_NOTE.to_string()),
			follow_up_message: DEFAULT_FOLLOW_UP_MESSAGE.to_string(),
		}
	}
}
