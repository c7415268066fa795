//! Daily admission gate for outreach actions.
//!
//! A [`QuotaGuard`] pairs a fixed limit with a [`QuotaCounter`]. Two counters
//! ship with the crate:
//!
//! - [`InMemoryQuota`] counts from zero for the life of the process.
//! - [`PersistentQuota`] counts in the run-state file under today's date, so a
//!   restart keeps the day's usage and the allowance resets when the date rolls
//!   over.

use std::fmt;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::error::Result;
use crate::state::{ActionKind, StateStore};

/// Outcome of a quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
	Allowed,
	/// Limit reached: stop this kind of outreach for the rest of the run.
	Denied,
}

impl Admission {
	pub fn is_allowed(self) -> bool {
		self == Admission::Allowed
	}
}

/// Source of "today" for date-scoped quotas.
pub trait Clock: Send + Sync {
	fn today(&self) -> NaiveDate;
}

/// Local calendar date of the host.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
	fn today(&self) -> NaiveDate {
		Local::now().date_naive()
	}
}

/// Settable clock for tests and replays.
#[derive(Debug)]
pub struct FixedClock {
	date: Mutex<NaiveDate>,
}

impl FixedClock {
	pub fn new(date: NaiveDate) -> Self {
		Self { date: Mutex::new(date) }
	}

	pub fn set(&self, date: NaiveDate) {
		*self.date.lock() = date;
	}
}

impl Clock for FixedClock {
	fn today(&self) -> NaiveDate {
		*self.date.lock()
	}
}

/// Backing count behind a [`QuotaGuard`].
///
/// `try_acquire` must check and increment atomically with respect to other
/// callers of the same counter.
pub trait QuotaCounter: Send + Sync + fmt::Debug {
	/// Increments the count and returns true if it is below `limit`.
	fn try_acquire(&self, limit: u32) -> Result<bool>;

	fn used(&self) -> u32;
}

/// Process-local counter. Starts at zero and is never persisted.
#[derive(Debug, Default)]
pub struct InMemoryQuota {
	count: Mutex<u32>,
}

impl QuotaCounter for InMemoryQuota {
	fn try_acquire(&self, limit: u32) -> Result<bool> {
		let mut count = self.count.lock();
		if *count >= limit {
			return Ok(false);
		}
		*count += 1;
		Ok(true)
	}

	fn used(&self) -> u32 {
		*self.count.lock()
	}
}

/// Counter stored per date in the run-state file.
pub struct PersistentQuota {
	store: Arc<StateStore>,
	kind: ActionKind,
	clock: Arc<dyn Clock>,
}

impl PersistentQuota {
	pub fn new(store: Arc<StateStore>, kind: ActionKind, clock: Arc<dyn Clock>) -> Self {
		Self { store, kind, clock }
	}
}

impl fmt::Debug for PersistentQuota {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("PersistentQuota")
			.field("path", &self.store.path())
			.field("kind", &self.kind)
			.field("today", &self.clock.today())
			.finish()
	}
}

impl QuotaCounter for PersistentQuota {
	fn try_acquire(&self, limit: u32) -> Result<bool> {
		self.store.admit_daily(self.kind, self.clock.today(), limit)
	}

	fn used(&self) -> u32 {
		self.store.daily_count(self.kind, self.clock.today())
	}
}

/// Read-only view of a guard's usage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaStatus {
	pub limit: u32,
	pub used: u32,
}

impl QuotaStatus {
	pub fn remaining(&self) -> u32 {
		self.limit.saturating_sub(self.used)
	}
}

/// Admission gate over a fixed limit.
#[derive(Debug)]
pub struct QuotaGuard {
	name: &'static str,
	limit: u32,
	counter: Box<dyn QuotaCounter>,
}

impl QuotaGuard {
	pub fn new(name: &'static str, limit: u32, counter: impl QuotaCounter + 'static) -> Self {
		Self {
			name,
			limit,
			counter: Box::new(counter),
		}
	}

	/// Guard whose count lives only as long as the process.
	pub fn in_memory(name: &'static str, limit: u32) -> Self {
		Self::new(name, limit, InMemoryQuota::default())
	}

	/// Guard counting `kind` actions per calendar day in `store`.
	pub fn persistent(limit: u32, store: Arc<StateStore>, kind: ActionKind, clock: Arc<dyn Clock>) -> Self {
		let name = match kind {
			ActionKind::Connection => "connection",
			ActionKind::Message => "message",
		};
		Self::new(name, limit, PersistentQuota::new(store, kind, clock))
	}

	/// Admits one action if the limit has not been reached.
	///
	/// `Denied` leaves the count unchanged. Errors only come from a counter
	/// that has to write, such as [`PersistentQuota`].
	pub fn admit(&self) -> Result<Admission> {
		if self.counter.try_acquire(self.limit)? {
			debug!(target = "outreach.quota", quota = self.name, limit = self.limit, "admitted");
			Ok(Admission::Allowed)
		} else {
			info!(target = "outreach.quota", quota = self.name, limit = self.limit, "daily limit reached");
			Ok(Admission::Denied)
		}
	}

	pub fn limit(&self) -> u32 {
		self.limit
	}

	pub fn status(&self) -> QuotaStatus {
		QuotaStatus {
			limit: self.limit,
			used: self.counter.used(),
		}
	}
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	fn date(y: i32, m: u32, d: u32) -> NaiveDate {
		NaiveDate::from_ymd_opt(y, m, d).unwrap()
	}

	#[test]
	fn limit_two_admits_twice_then_denies() {
		let guard = QuotaGuard::in_memory("connection", 2);
		let results: Vec<_> = (0..3).map(|_| guard.admit().unwrap()).collect();
		assert_eq!(results, vec![Admission::Allowed, Admission::Allowed, Admission::Denied]);
	}

	#[test]
	fn admits_exactly_limit_calls() {
		for limit in [0, 1, 5, 17] {
			let guard = QuotaGuard::in_memory("connection", limit);
			let allowed = (0..limit + 10).filter(|_| guard.admit().unwrap().is_allowed()).count();
			assert_eq!(allowed as u32, limit, "limit {limit}");
			assert_eq!(guard.status().used, limit);
			assert_eq!(guard.status().remaining(), 0);
		}
	}

	#[test]
	fn denied_leaves_count_unchanged() {
		let guard = QuotaGuard::in_memory("message", 1);
		guard.admit().unwrap();
		for _ in 0..3 {
			assert_eq!(guard.admit().unwrap(), Admission::Denied);
		}
		assert_eq!(guard.status(), QuotaStatus { limit: 1, used: 1 });
	}

	#[test]
	fn persistent_quota_survives_restart_on_same_day() {
		let dir = TempDir::new().unwrap();
		let path = dir.path().join("state.json");
		let clock = Arc::new(FixedClock::new(date(2026, 5, 1)));

		{
			let store = Arc::new(StateStore::open(&path).unwrap());
			let guard = QuotaGuard::persistent(3, store, ActionKind::Connection, clock.clone());
			assert!(guard.admit().unwrap().is_allowed());
			assert!(guard.admit().unwrap().is_allowed());
		}

		let store = Arc::new(StateStore::open(&path).unwrap());
		let guard = QuotaGuard::persistent(3, store, ActionKind::Connection, clock.clone());
		assert_eq!(guard.status().used, 2);
		assert_eq!(guard.admit().unwrap(), Admission::Allowed);
		assert_eq!(guard.admit().unwrap(), Admission::Denied);
	}

	#[test]
	fn persistent_quota_resets_when_date_rolls_over() {
		let dir = TempDir::new().unwrap();
		let store = Arc::new(StateStore::open(dir.path().join("state.json")).unwrap());
		let clock = Arc::new(FixedClock::new(date(2026, 5, 1)));
		let guard = QuotaGuard::persistent(1, store, ActionKind::Message, clock.clone());

		assert_eq!(guard.admit().unwrap(), Admission::Allowed);
		assert_eq!(guard.admit().unwrap(), Admission::Denied);

		clock.set(date(2026, 5, 2));
		assert_eq!(guard.status().used, 0);
		assert_eq!(guard.admit().unwrap(), Admission::Allowed);
	}

	#[test]
	fn kinds_are_counted_separately() {
		let dir = TempDir::new().unwrap();
		let store = Arc::new(StateStore::open(dir.path().join("state.json")).unwrap());
		let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(date(2026, 5, 1)));
		let connections = QuotaGuard::persistent(1, store.clone(), ActionKind::Connection, clock.clone());
		let messages = QuotaGuard::persistent(1, store, ActionKind::Message, clock);

		assert!(connections.admit().unwrap().is_allowed());
		assert!(messages.admit().unwrap().is_allowed());
		assert!(!connections.admit().unwrap().is_allowed());
	}

	#[test]
	fn concurrent_admits_never_exceed_limit() {
		let dir = TempDir::new().unwrap();
		let store = Arc::new(StateStore::open(dir.path().join("state.json")).unwrap());
		let clock = Arc::new(FixedClock::new(date(2026, 5, 1)));
		let guard = Arc::new(QuotaGuard::persistent(25, store.clone(), ActionKind::Connection, clock));

		let handles: Vec<_> = (0..8)
			.map(|_| {
				let guard = Arc::clone(&guard);
				std::thread::spawn(move || (0..10).filter(|_| guard.admit().unwrap().is_allowed()).count())
			})
			.collect();
		let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

		assert_eq!(allowed, 25);
		assert_eq!(store.daily_count(ActionKind::Connection, date(2026, 5, 1)), 25);
	}
}
