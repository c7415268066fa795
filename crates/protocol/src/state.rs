//! Run-state file layout.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Actions admitted on a single calendar day.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DailyActions {
	#[serde(default)]
	pub connections: u32,
	#[serde(default)]
	pub messages: u32,
}

/// On-disk format of the run-state file.
///
/// The three target maps use `identifier -> true`; an entry mapped to `false`
/// is not a member. Every key is optional so files written by older runs (or
/// by hand) still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct StateFile {
	#[serde(default)]
	pub visited_profiles: BTreeMap<String, bool>,
	#[serde(default)]
	pub sent_connections: BTreeMap<String, bool>,
	#[serde(default)]
	pub sent_messages: BTreeMap<String, bool>,
	/// Lifetime connection counter. The key name predates per-day tracking.
	#[serde(default)]
	pub connections_today: u64,
	#[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
	pub daily_actions: BTreeMap<NaiveDate, DailyActions>,
}
