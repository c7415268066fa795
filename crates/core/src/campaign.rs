//! Consult / act / record loop around an external browser driver.
//!
//! A run has two passes over the discovered targets:
//!
//! 1. Connect pass: skip targets already visited, ask the connection quota,
//!    drive the request, then record the visit and the sent request.
//! 2. Message pass: for targets connected with but not yet messaged, ask the
//!    message quota, drive the message, then record it.
//!
//! A quota denial ends the current pass. A driver error is logged against its
//! target and the pass moves on. A store error aborts the run.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::Result;
use crate::ledger::OutreachLedger;
use crate::quota::Admission;
use crate::state::ActionKind;

pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

/// What the driver did with a target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverOutcome {
	Sent,
	/// The page offered no way to act (no Connect button, messaging closed).
	Skipped(String),
}

/// Browser-side actions. Implemented outside this crate.
#[async_trait]
pub trait OutreachDriver: Send {
	async fn send_connection(&mut self, target: &str, note: Option<&str>) -> std::result::Result<DriverOutcome, DriverError>;

	async fn send_message(&mut self, target: &str, text: &str) -> std::result::Result<DriverOutcome, DriverError>;
}

/// Counts for one pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
	pub sent: usize,
	pub skipped: usize,
	pub already_done: usize,
	pub failed: Vec<(String, String)>,
	pub quota_exhausted: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignReport {
	pub connections: PassReport,
	pub messages: PassReport,
}

/// Drives one outreach run.
pub struct Campaign<'a, D> {
	ledger: &'a OutreachLedger,
	driver: D,
	note: Option<String>,
	message: String,
}

impl<'a, D: OutreachDriver> Campaign<'a, D> {
	pub fn new(ledger: &'a OutreachLedger, driver: D, config: &RunConfig) -> Self {
		Self {
			ledger,
			driver,
			note: config.connection_note.clone(),
			message: config.follow_up_message.clone(),
		}
	}

	pub fn into_driver(self) -> D {
		self.driver
	}

	pub async fn run(&mut self, targets: &[String]) -> Result<CampaignReport> {
		let connections = self.connect_pass(targets).await?;
		let messages = self.message_pass(targets).await?;
		info!(
			target = "outreach.campaign",
			connections_sent = connections.sent,
			messages_sent = messages.sent,
			failures = connections.failed.len() + messages.failed.len(),
			"run complete"
		);
		Ok(CampaignReport { connections, messages })
	}

	async fn connect_pass(&mut self, targets: &[String]) -> Result<PassReport> {
		let mut report = PassReport::default();

		for target in targets {
			if self.ledger.has_visited(target) {
				debug!(target = "outreach.campaign", profile = %target, "already visited");
				report.already_done += 1;
				continue;
			}
			if self.ledger.admit(ActionKind::Connection)? == Admission::Denied {
				report.quota_exhausted = true;
				break;
			}

			match self.driver.send_connection(target, self.note.as_deref()).await {
				Ok(DriverOutcome::Sent) => {
					self.ledger.mark_visited(target)?;
					self.ledger.mark_connection_sent(target)?;
					info!(target = "outreach.campaign", profile = %target, "connection request sent");
					report.sent += 1;
				}
				Ok(DriverOutcome::Skipped(reason)) => {
					self.ledger.mark_visited(target)?;
					info!(target = "outreach.campaign", profile = %target, %reason, "connection skipped");
					report.skipped += 1;
				}
				Err(err) => {
					warn!(target = "outreach.campaign", profile = %target, error = %err, "connection request failed");
					report.failed.push((target.clone(), err.to_string()));
				}
			}
		}

		Ok(report)
	}

	async fn message_pass(&mut self, targets: &[String]) -> Result<PassReport> {
		let mut report = PassReport::default();

		for target in targets {
			if !self.ledger.has_sent_connection(target) {
				continue;
			}
			if self.ledger.has_sent_message(target) {
				report.already_done += 1;
				continue;
			}
			if self.ledger.admit(ActionKind::Message)? == Admission::Denied {
				report.quota_exhausted = true;
				break;
			}

			match self.driver.send_message(target, &self.message).await {
				Ok(DriverOutcome::Sent) => {
					self.ledger.mark_message_sent(target)?;
					info!(target = "outreach.campaign", profile = %target, "message sent");
					report.sent += 1;
				}
				Ok(DriverOutcome::Skipped(reason)) => {
					info!(target = "outreach.campaign", profile = %target, %reason, "message skipped");
					report.skipped += 1;
				}
				Err(err) => {
					warn!(target = "outreach.campaign", profile = %target, error = %err, "message failed");
					report.failed.push((target.clone(), err.to_string()));
				}
			}
		}

		Ok(report)
	}
}
