//! Durable ledger of contacted targets.
//!
//! [`StateStore`] owns the run-state file. Every mutation happens under one
//! lock that also covers the disk write, so concurrent callers observe a total
//! order of updates and the file always matches some prefix of that order.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use outreach_protocol::{DailyActions, StateFile};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::io;

const FILE_KIND: &str = "state";

/// Which of the three target sets an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
	Visited,
	Connection,
	Message,
}

impl Category {
	pub const ALL: [Category; 3] = [Category::Visited, Category::Connection, Category::Message];
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Category::Visited => write!(f, "visited"),
			Category::Connection => write!(f, "connection"),
			Category::Message => write!(f, "message"),
		}
	}
}

/// An outreach action subject to a daily quota.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
	Connection,
	Message,
}

impl ActionKind {
	pub const ALL: [ActionKind; 2] = [ActionKind::Connection, ActionKind::Message];

	fn count(self, day: &DailyActions) -> u32 {
		match self {
			ActionKind::Connection => day.connections,
			ActionKind::Message => day.messages,
		}
	}

	fn count_mut(self, day: &mut DailyActions) -> &mut u32 {
		match self {
			ActionKind::Connection => &mut day.connections,
			ActionKind::Message => &mut day.messages,
		}
	}
}

impl fmt::Display for ActionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ActionKind::Connection => write!(f, "connection"),
			ActionKind::Message => write!(f, "message"),
		}
	}
}

/// Everything remembered between runs.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunState {
	pub visited: BTreeSet<String>,
	pub connected_with: BTreeSet<String>,
	pub messaged_with: BTreeSet<String>,
	/// Lifetime number of connection requests sent.
	pub connections_total: u64,
	pub daily: BTreeMap<NaiveDate, DailyActions>,
}

impl RunState {
	pub fn set(&self, category: Category) -> &BTreeSet<String> {
		match category {
			Category::Visited => &self.visited,
			Category::Connection => &self.connected_with,
			Category::Message => &self.messaged_with,
		}
	}

	fn set_mut(&mut self, category: Category) -> &mut BTreeSet<String> {
		match category {
			Category::Visited => &mut self.visited,
			Category::Connection => &mut self.connected_with,
			Category::Message => &mut self.messaged_with,
		}
	}

	pub fn contains(&self, category: Category, id: &str) -> bool {
		self.set(category).contains(id)
	}

	/// Actions of `kind` recorded for `date`.
	pub fn daily_count(&self, kind: ActionKind, date: NaiveDate) -> u32 {
		self.daily.get(&date).map(|day| kind.count(day)).unwrap_or(0)
	}

	pub fn consistency_report(&self) -> ConsistencyReport {
		ConsistencyReport {
			connected_not_visited: self.connected_with.difference(&self.visited).cloned().collect(),
			connections_total: self.connections_total,
			connected_count: self.connected_with.len(),
		}
	}
}

impl From<StateFile> for RunState {
	fn from(file: StateFile) -> Self {
		fn members(map: BTreeMap<String, bool>) -> BTreeSet<String> {
			map.into_iter().filter_map(|(id, present)| present.then_some(id)).collect()
		}

		Self {
			visited: members(file.visited_profiles),
			connected_with: members(file.sent_connections),
			messaged_with: members(file.sent_messages),
			connections_total: file.connections_today,
			daily: file.daily_actions,
		}
	}
}

impl From<&RunState> for StateFile {
	fn from(state: &RunState) -> Self {
		fn as_map(set: &BTreeSet<String>) -> BTreeMap<String, bool> {
			set.iter().map(|id| (id.clone(), true)).collect()
		}

		Self {
			visited_profiles: as_map(&state.visited),
			sent_connections: as_map(&state.connected_with),
			sent_messages: as_map(&state.messaged_with),
			connections_today: state.connections_total,
			daily_actions: state.daily.clone(),
		}
	}
}

/// Places where the ledger disagrees with its own intended invariants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyReport {
	/// Targets marked connected without a visit on record.
	pub connected_not_visited: Vec<String>,
	pub connections_total: u64,
	pub connected_count: usize,
}

impl ConsistencyReport {
	/// Counter minus connected-set size. Non-zero after an older run
	/// re-sent to a known target, or after a manual `forget`.
	pub fn counter_drift(&self) -> i64 {
		self.connections_total as i64 - self.connected_count as i64
	}

	pub fn is_clean(&self) -> bool {
		self.connected_not_visited.is_empty() && self.counter_drift() == 0
	}
}

/// Write-through, mutex-guarded owner of the run-state file.
#[derive(Debug)]
pub struct StateStore {
	path: PathBuf,
	state: Mutex<RunState>,
}

impl StateStore {
	/// Loads the state file, creating it with an empty state if it is missing.
	///
	/// # Errors
	///
	/// Returns [`StoreError::Format`](crate::StoreError::Format) when the file
	/// exists but does not parse (the file itself is left untouched), and
	/// [`StoreError::Io`](crate::StoreError::Io) when it cannot be read or the
	/// fresh file cannot be written.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
		Self::load(path.into(), true)
	}

	/// Loads the state file without creating it.
	///
	/// A missing file yields an empty in-memory state and nothing is written.
	/// Later mutations still write through and create the file.
	pub fn inspect(path: impl Into<PathBuf>) -> Result<Self> {
		Self::load(path.into(), false)
	}

	fn load(path: PathBuf, create: bool) -> Result<Self> {
		let state = match io::read_json::<StateFile>(&path, FILE_KIND)? {
			Some(file) => {
				let state = RunState::from(file);
				debug!(
					target = "outreach.state",
					path = %path.display(),
					visited = state.visited.len(),
					connected = state.connected_with.len(),
					messaged = state.messaged_with.len(),
					"loaded run state"
				);
				state
			}
			None if create => {
				let state = RunState::default();
				persist(&path, &state)?;
				info!(target = "outreach.state", path = %path.display(), "created fresh run state");
				state
			}
			None => RunState::default(),
		};

		let report = state.consistency_report();
		if !report.is_clean() {
			warn!(
				target = "outreach.state",
				path = %path.display(),
				connected_not_visited = report.connected_not_visited.len(),
				counter_drift = report.counter_drift(),
				"run state is inconsistent"
			);
		}

		Ok(Self {
			path,
			state: Mutex::new(state),
		})
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Returns a copy of the current state.
	pub fn snapshot(&self) -> RunState {
		self.state.lock().clone()
	}

	pub fn contains(&self, category: Category, id: &str) -> bool {
		self.state.lock().contains(category, id)
	}

	/// Adds `id` to a set and persists. Returns true if it was not present.
	///
	/// Recording a present identifier leaves the state unchanged but still
	/// rewrites the file.
	pub fn record(&self, category: Category, id: &str) -> Result<bool> {
		self.mutate(|state| state.set_mut(category).insert(id.to_string()))
	}

	/// Records a sent connection request.
	///
	/// The lifetime counter moves only when `id` is new, so repeated reports
	/// for the same target cannot inflate it.
	pub fn mark_connection_sent(&self, id: &str) -> Result<bool> {
		self.mutate(|state| {
			let inserted = state.connected_with.insert(id.to_string());
			if inserted {
				state.connections_total += 1;
			}
			inserted
		})
	}

	/// Increments the lifetime connection counter and persists.
	pub fn increment_connection_counter(&self) -> Result<u64> {
		self.mutate(|state| {
			state.connections_total += 1;
			state.connections_total
		})
	}

	/// Removes `id` from a set. Returns true if it was present.
	///
	/// The lifetime counter is left alone; see [`ConsistencyReport::counter_drift`].
	pub fn forget(&self, category: Category, id: &str) -> Result<bool> {
		let mut state = self.state.lock();
		if !state.set_mut(category).remove(id) {
			return Ok(false);
		}
		persist(&self.path, &state)?;
		Ok(true)
	}

	/// Actions of `kind` recorded for `date`.
	pub fn daily_count(&self, kind: ActionKind, date: NaiveDate) -> u32 {
		self.state.lock().daily_count(kind, date)
	}

	/// Check-and-increment of the `kind` count for `date`.
	///
	/// Returns false without touching the file when `limit` is already reached.
	pub fn admit_daily(&self, kind: ActionKind, date: NaiveDate, limit: u32) -> Result<bool> {
		let mut state = self.state.lock();
		if state.daily_count(kind, date) >= limit {
			return Ok(false);
		}
		*kind.count_mut(state.daily.entry(date).or_default()) += 1;
		persist(&self.path, &state)?;
		Ok(true)
	}

	/// Drops daily entries dated before `cutoff`. Returns how many were removed.
	pub fn prune_daily(&self, cutoff: NaiveDate) -> Result<usize> {
		let mut state = self.state.lock();
		let before = state.daily.len();
		let kept = state.daily.split_off(&cutoff);
		state.daily = kept;
		let removed = before - state.daily.len();
		if removed > 0 {
			persist(&self.path, &state)?;
		}
		Ok(removed)
	}

	pub fn consistency_report(&self) -> ConsistencyReport {
		self.state.lock().consistency_report()
	}

	fn mutate<T>(&self, f: impl FnOnce(&mut RunState) -> T) -> Result<T> {
		let mut state = self.state.lock();
		let out = f(&mut *state);
		persist(&self.path, &state)?;
		Ok(out)
	}
}

fn persist(path: &Path, state: &RunState) -> Result<()> {
	io::write_json(path, FILE_KIND, &StateFile::from(state))
}
