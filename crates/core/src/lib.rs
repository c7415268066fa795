//! Persisted run state, session cookies and daily quotas for browser outreach.
//!
//! This crate is the part of an outreach bot that makes repeated, interrupted
//! or restarted runs safe. The browser itself lives elsewhere and talks to
//! this crate through [`OutreachLedger`] (or [`Campaign`], which runs the
//! consult / act / record loop over an [`OutreachDriver`]).
//!
//! # Files
//!
//! * `state.json` - visited / connected / messaged targets, the lifetime
//!   connection counter and per-day action counts ([`StateStore`]).
//! * `cookies.json` - the last saved browser session ([`SessionStore`]).
//!
//! Both are rewritten atomically on every change and never held open between
//! calls.

pub mod campaign;
pub mod config;
pub mod error;
pub mod io;
pub mod ledger;
pub mod quota;
pub mod session;
pub mod state;

pub use campaign::{Campaign, CampaignReport, DriverError, DriverOutcome, OutreachDriver, PassReport};
pub use config::RunConfig;
pub use error::{Result, StoreError};
pub use ledger::OutreachLedger;
pub use outreach_protocol::{Cookie, SameSite};
pub use quota::{Admission, Clock, FixedClock, InMemoryQuota, PersistentQuota, QuotaCounter, QuotaGuard, QuotaStatus, SystemClock};
pub use session::SessionStore;
pub use state::{ActionKind, Category, ConsistencyReport, RunState, StateStore};
