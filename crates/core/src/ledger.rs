//! Single entry point the orchestrator talks to.
//!
//! [`OutreachLedger`] bundles the run-state store, the session cookie store and
//! the daily quota guards. Every mutating call writes through to disk; any
//! error it returns means dedup or rate-limit guarantees can no longer be
//! kept, and the run should stop.

use std::sync::Arc;

use outreach_protocol::Cookie;
use tracing::info;

use crate::config::RunConfig;
use crate::error::Result;
use crate::quota::{Admission, Clock, QuotaGuard, QuotaStatus};
use crate::session::SessionStore;
use crate::state::{ActionKind, Category, StateStore};

pub struct OutreachLedger {
	state: Arc<StateStore>,
	session: SessionStore,
	connections: QuotaGuard,
	messages: Option<QuotaGuard>,
	clock: Arc<dyn Clock>,
}

impl OutreachLedger {
	/// Opens the stores named in `config` with date-scoped quotas.
	///
	/// # Errors
	///
	/// Fails if the state file is unreadable, unparseable or unwritable. The
	/// session file is not touched until [`load_session`](Self::load_session).
	pub fn open(config: &RunConfig, clock: Arc<dyn Clock>) -> Result<Self> {
		let state = StateStore::open(&config.state_file)?;
		Ok(Self::with_state(config, state, clock))
	}

	/// Like [`open`](Self::open), but a missing state file is not created.
	///
	/// For read-only callers such as previews and status reports.
	pub fn inspect(config: &RunConfig, clock: Arc<dyn Clock>) -> Result<Self> {
		let state = StateStore::inspect(&config.state_file)?;
		Ok(Self::with_state(config, state, clock))
	}

	fn with_state(config: &RunConfig, state: StateStore, clock: Arc<dyn Clock>) -> Self {
		let state = Arc::new(state);
		let connections = QuotaGuard::persistent(config.daily_connection_limit, state.clone(), ActionKind::Connection, clock.clone());
		let messages = config
			.daily_message_limit
			.map(|limit| QuotaGuard::persistent(limit, state.clone(), ActionKind::Message, clock.clone()));

		info!(
			target = "outreach.ledger",
			state = %config.state_file.display(),
			session = %config.session_file.display(),
			connection_limit = config.daily_connection_limit,
			message_limit = ?config.daily_message_limit,
			"ledger ready"
		);

		Self::from_parts(state, SessionStore::new(&config.session_file), connections, messages, clock)
	}

	/// Assembles a ledger from already-built parts.
	pub fn from_parts(state: Arc<StateStore>, session: SessionStore, connections: QuotaGuard, messages: Option<QuotaGuard>, clock: Arc<dyn Clock>) -> Self {
		Self {
			state,
			session,
			connections,
			messages,
			clock,
		}
	}

	pub fn state(&self) -> &Arc<StateStore> {
		&self.state
	}

	pub fn session_store(&self) -> &SessionStore {
		&self.session
	}

	pub fn has_visited(&self, id: &str) -> bool {
		self.state.contains(Category::Visited, id)
	}

	pub fn mark_visited(&self, id: &str) -> Result<()> {
		self.state.record(Category::Visited, id).map(drop)
	}

	pub fn has_sent_connection(&self, id: &str) -> bool {
		self.state.contains(Category::Connection, id)
	}

	/// Records a sent connection request and bumps the lifetime counter.
	pub fn mark_connection_sent(&self, id: &str) -> Result<()> {
		self.state.mark_connection_sent(id).map(drop)
	}

	pub fn has_sent_message(&self, id: &str) -> bool {
		self.state.contains(Category::Message, id)
	}

	pub fn mark_message_sent(&self, id: &str) -> Result<()> {
		self.state.record(Category::Message, id).map(drop)
	}

	pub fn load_session(&self) -> Result<Option<Vec<Cookie>>> {
		self.session.load()
	}

	pub fn save_session(&self, cookies: &[Cookie]) -> Result<()> {
		self.session.save(cookies)
	}

	/// Consults the daily quota for `kind`.
	///
	/// Messages are always allowed when no message limit is configured; they
	/// are still counted under today's date.
	pub fn admit(&self, kind: ActionKind) -> Result<Admission> {
		match self.guard(kind) {
			Some(guard) => guard.admit(),
			None => {
				self.state.admit_daily(kind, self.clock.today(), u32::MAX)?;
				Ok(Admission::Allowed)
			}
		}
	}

	/// Usage of the quota for `kind`, or `None` if it is ungated.
	pub fn quota_status(&self, kind: ActionKind) -> Option<QuotaStatus> {
		self.guard(kind).map(QuotaGuard::status)
	}

	fn guard(&self, kind: ActionKind) -> Option<&QuotaGuard> {
		match kind {
			ActionKind::Connection => Some(&self.connections),
			ActionKind::Message => self.messages.as_ref(),
		}
	}
}
