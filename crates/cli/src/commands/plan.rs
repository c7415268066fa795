//! Read-only preview of what the next run would do with a target list.

use std::fmt::Write as _;
use std::path::Path;

use anyhow::{Context, Result};
use outreach::{ActionKind, OutreachLedger, RunConfig};
use serde::Serialize;

use super::inspect_ledger;
use crate::output::{OutputFormat, emit};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
enum Step {
	Send,
	AlreadyDone,
	OverQuota,
	/// Message step for a target that will not be connected with.
	NotApplicable,
}

impl Step {
	fn label(self) -> &'static str {
		match self {
			Step::Send => "send",
			Step::AlreadyDone => "done",
			Step::OverQuota => "over quota",
			Step::NotApplicable => "-",
		}
	}
}

#[derive(Debug, Serialize)]
struct PlannedTarget {
	id: String,
	connect: Step,
	message: Step,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Plan {
	targets: Vec<PlannedTarget>,
	connections: usize,
	messages: usize,
}

pub fn run(targets: &Path, config: &RunConfig, format: OutputFormat) -> Result<()> {
	let contents = std::fs::read_to_string(targets).with_context(|| format!("cannot read target list {}", targets.display()))?;
	let ids = parse_targets(&contents);
	let ledger = inspect_ledger(config)?;
	let plan = build(&ledger, &ids);
	emit(format, "plan", &plan, render)
}

/// One identifier per line. Blank lines and `#` comments are ignored.
fn parse_targets(contents: &str) -> Vec<String> {
	contents
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty() && !line.starts_with('#'))
		.map(String::from)
		.collect()
}

fn build(ledger: &OutreachLedger, ids: &[String]) -> Plan {
	let mut connect_left = ledger.quota_status(ActionKind::Connection).map(|s| s.remaining());
	let mut message_left = ledger.quota_status(ActionKind::Message).map(|s| s.remaining());

	let targets: Vec<PlannedTarget> = ids
		.iter()
		.map(|id| {
			let connect = if ledger.has_visited(id) { Step::AlreadyDone } else { take(&mut connect_left) };
			let connected = ledger.has_sent_connection(id) || connect == Step::Send;
			let message = if !connected {
				Step::NotApplicable
			} else if ledger.has_sent_message(id) {
				Step::AlreadyDone
			} else {
				take(&mut message_left)
			};
			PlannedTarget { id: id.clone(), connect, message }
		})
		.collect();

	Plan {
		connections: targets.iter().filter(|t| t.connect == Step::Send).count(),
		messages: targets.iter().filter(|t| t.message == Step::Send).count(),
		targets,
	}
}

/// Spends one unit of a simulated quota. `None` means ungated.
fn take(left: &mut Option<u32>) -> Step {
	match left {
		None => Step::Send,
		Some(0) => Step::OverQuota,
		Some(n) => {
			*n -= 1;
			Step::Send
		}
	}
}

fn render(plan: &Plan) -> String {
	if plan.targets.is_empty() {
		return "No targets.".into();
	}

	let mut out = String::new();
	let _ = writeln!(out, "  {:<48} {:<12} {:<12}", "TARGET", "CONNECT", "MESSAGE");
	let _ = writeln!(out, "  {}", "-".repeat(72));
	for t in &plan.targets {
		let _ = writeln!(out, "  {:<48} {:<12} {:<12}", t.id, t.connect.label(), t.message.label());
	}
	let _ = write!(out, "\nWould send {} connection requests and {} messages.", plan.connections, plan.messages);
	out
}
