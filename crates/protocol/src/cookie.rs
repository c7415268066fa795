//! Browser cookie records as stored in the session credential file.

use serde::{Deserialize, Serialize};

/// Cookie `SameSite` policy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SameSite {
	Strict,
	Lax,
	None,
}

impl std::fmt::Display for SameSite {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			SameSite::Strict => write!(f, "Strict"),
			SameSite::Lax => write!(f, "Lax"),
			SameSite::None => write!(f, "None"),
		}
	}
}

/// A single browser cookie.
///
/// Field names follow the CDP / Playwright cookie shape (`httpOnly`,
/// `sameSite`), so files captured by other browser tooling load as-is.
/// Extra fields such as `size` or `priority` are ignored on read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Cookie {
	pub name: String,
	pub value: String,
	#[serde(default)]
	pub domain: String,
	#[serde(default = "default_path")]
	pub path: String,
	/// Unix time in seconds. Absent or negative means a session cookie.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub expires: Option<f64>,
	#[serde(default)]
	pub http_only: bool,
	#[serde(default)]
	pub secure: bool,
	/// Absent in CDP dumps that leave the policy to the browser; kept absent on save.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub same_site: Option<SameSite>,
}

fn default_path() -> String {
	"/".to_string()
}

/// One `localStorage` entry of a storage-state origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LocalStorageEntry {
	pub name: String,
	pub value: String,
}

/// `localStorage` snapshot for a single origin.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OriginState {
	pub origin: String,
	#[serde(default)]
	pub local_storage: Vec<LocalStorageEntry>,
}

/// Playwright `storageState()` file: cookies plus per-origin storage.
///
/// `cookies` is required and no other keys are accepted, so an unrelated JSON
/// object is rejected instead of loading as an empty session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct StorageState {
	pub cookies: Vec<Cookie>,
	#[serde(default)]
	pub origins: Vec<OriginState>,
}

/// Accepted layouts of a session credential file.
///
/// Files written by this crate are always [`CookieFile::Cookies`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum CookieFile {
	Cookies(Vec<Cookie>),
	StorageState(StorageState),
}

impl CookieFile {
	pub fn into_cookies(self) -> Vec<Cookie> {
		match self {
			CookieFile::Cookies(cookies) => cookies,
			CookieFile::StorageState(state) => state.cookies,
		}
	}
}
