use anyhow::Result;
use chrono::NaiveDate;
use outreach::{ActionKind, Clock, OutreachLedger, RunConfig, SystemClock};
use serde::Serialize;

use super::inspect_ledger;
use crate::cli::QuotaAction;
use crate::output::{OutputFormat, emit};

#[derive(Debug, Serialize)]
pub(super) struct KindUsage {
	pub kind: String,
	/// `None` when this kind is not gated.
	pub limit: Option<u32>,
	pub used: u32,
	pub remaining: Option<u32>,
}

#[derive(Debug, Serialize)]
pub(super) struct QuotaReport {
	pub date: NaiveDate,
	pub kinds: Vec<KindUsage>,
}

pub fn run(action: QuotaAction, config: &RunConfig, format: OutputFormat) -> Result<()> {
	match action {
		QuotaAction::Status => {
			let ledger = inspect_ledger(config)?;
			let report = usage(&ledger, SystemClock.today());
			emit(format, "quota.status", &report, render)
		}
	}
}

pub(super) fn usage(ledger: &OutreachLedger, today: NaiveDate) -> QuotaReport {
	let kinds = ActionKind::ALL
		.iter()
		.map(|&kind| match ledger.quota_status(kind) {
			Some(status) => KindUsage {
				kind: kind.to_string(),
				limit: Some(status.limit),
				used: status.used,
				remaining: Some(status.remaining()),
			},
			None => KindUsage {
				kind: kind.to_string(),
				limit: None,
				used: ledger.state().daily_count(kind, today),
				remaining: None,
			},
		})
		.collect();

	QuotaReport { date: today, kinds }
}

fn render(report: &QuotaReport) -> String {
	let mut lines = vec![format!("Quota for {}:", report.date)];
	for usage in &report.kinds {
		let line = match (usage.limit, usage.remaining) {
			(Some(limit), Some(remaining)) => format!("  {:<12} {}/{} used, {} left", usage.kind, usage.used, limit, remaining),
			_ => format!("  {:<12} {} sent, no daily limit", usage.kind, usage.used),
		};
		lines.push(line);
	}
	lines.join("\n")
}
