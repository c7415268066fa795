//! Session cookie persistence.
//!
//! Restoring a session installs whatever was saved: expired cookies are
//! returned as-is. Detecting that the restored session is not actually
//! authenticated, and falling back to a full login, is the caller's job.

use std::path::{Path, PathBuf};

use outreach_protocol::{Cookie, CookieFile};
use tracing::{debug, info};

use crate::error::Result;
use crate::io;

const FILE_KIND: &str = "session";

/// Owner of the session credential file.
#[derive(Debug, Clone)]
pub struct SessionStore {
	path: PathBuf,
}

impl SessionStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Loads saved cookies. `Ok(None)` on first run, when no file exists yet.
	///
	/// Accepts both a bare cookie array and a Playwright storage-state object.
	pub fn load(&self) -> Result<Option<Vec<Cookie>>> {
		let Some(file) = io::read_json::<CookieFile>(&self.path, FILE_KIND)? else {
			debug!(target = "outreach.session", path = %self.path.display(), "no saved session");
			return Ok(None);
		};
		let cookies = file.into_cookies();
		debug!(target = "outreach.session", path = %self.path.display(), cookies = cookies.len(), "loaded saved session");
		Ok(Some(cookies))
	}

	/// Replaces the saved session with `cookies`. Never merges.
	pub fn save(&self, cookies: &[Cookie]) -> Result<()> {
		io::write_json(&self.path, FILE_KIND, &cookies)?;
		info!(target = "outreach.session", path = %self.path.display(), cookies = cookies.len(), "saved session");
		Ok(())
	}

	/// Deletes the saved session. Returns false if there was none.
	pub fn clear(&self) -> Result<bool> {
		io::remove_if_exists(&self.path)
	}
}

/// Returns true for a cookie without an expiry.
pub fn is_session_cookie(cookie: &Cookie) -> bool {
	cookie.expires.is_none_or(|ts| ts < 0.0)
}

/// Returns true if `cookie` has an expiry at or before `now` (unix seconds).
pub fn is_expired_at(cookie: &Cookie, now: i64) -> bool {
	match cookie.expires {
		Some(ts) if ts >= 0.0 => ts as i64 <= now,
		_ => false,
	}
}
