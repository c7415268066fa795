use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::{Days, NaiveDate};
use outreach::{ActionKind, Category, Clock, RunConfig, StateStore, SystemClock};
use serde::Serialize;
use tracing::info;

use crate::cli::StateAction;
use crate::output::{OutputFormat, emit};

pub fn run(action: StateAction, config: &RunConfig, format: OutputFormat) -> Result<()> {
	let store = StateStore::open(&config.state_file).with_context(|| format!("cannot use run state at {}", config.state_file.display()))?;
	let today = SystemClock.today();

	match action {
		StateAction::Show => emit(format, "state.show", &summarize(&store, today), render_summary),
		StateAction::Check { id } => emit(format, "state.check", &check(&store, &id), render_check),
		StateAction::Forget { id, category } => {
			let categories = match category {
				Some(category) => vec![Category::from(category)],
				None => Category::ALL.to_vec(),
			};
			let mut removed = Vec::new();
			for category in categories {
				if store.forget(category, &id)? {
					removed.push(category.to_string());
				}
			}
			info!(target = "outreach.state", %id, removed = ?removed, "forgot target");
			let data = Forgotten { id, removed };
			emit(format, "state.forget", &data, |d| {
				if d.removed.is_empty() {
					format!("{} was not recorded", d.id)
				} else {
					format!("Removed {} from: {}", d.id, d.removed.join(", "))
				}
			})
		}
		StateAction::Prune { keep_days } => {
			let cutoff = today.checked_sub_days(Days::new(u64::from(keep_days))).unwrap_or(NaiveDate::MIN);
			let removed = store.prune_daily(cutoff)?;
			let data = Pruned { cutoff, removed };
			emit(format, "state.prune", &data, |d| format!("Dropped {} daily entries before {}", d.removed, d.cutoff))
		}
	}
}

#[derive(Debug, Serialize)]
struct DailyUsage {
	date: NaiveDate,
	connections: u32,
	messages: u32,
}

#[derive(Debug, Serialize)]
struct StateSummary {
	path: String,
	visited: usize,
	connected: usize,
	messaged: usize,
	connections_total: u64,
	today: DailyUsage,
	connected_not_visited: Vec<String>,
	counter_drift: i64,
}

fn summarize(store: &StateStore, today: NaiveDate) -> StateSummary {
	let state = store.snapshot();
	let report = state.consistency_report();
	StateSummary {
		path: store.path().display().to_string(),
		visited: state.visited.len(),
		connected: state.connected_with.len(),
		messaged: state.messaged_with.len(),
		connections_total: state.connections_total,
		today: DailyUsage {
			date: today,
			connections: state.daily_count(ActionKind::Connection, today),
			messages: state.daily_count(ActionKind::Message, today),
		},
		counter_drift: report.counter_drift(),
		connected_not_visited: report.connected_not_visited,
	}
}

fn render_summary(s: &StateSummary) -> String {
	let mut out = String::new();
	let _ = writeln!(out, "Run state: {}", s.path);
	let _ = writeln!(out);
	let _ = writeln!(out, "  {:<22} {}", "Visited", s.visited);
	let _ = writeln!(out, "  {:<22} {}", "Connections sent", s.connected);
	let _ = writeln!(out, "  {:<22} {}", "Messages sent", s.messaged);
	let _ = writeln!(out, "  {:<22} {}", "Lifetime counter", s.connections_total);
	let _ = writeln!(
		out,
		"  {:<22} {} connections, {} messages",
		format!("Today ({})", s.today.date),
		s.today.connections,
		s.today.messages
	);

	if s.connected_not_visited.is_empty() && s.counter_drift == 0 {
		let _ = write!(out, "\nNo inconsistencies.");
		return out;
	}

	let _ = writeln!(out, "\nINCONSISTENCIES:");
	if s.counter_drift != 0 {
		let _ = writeln!(out, "  counter differs from connections sent by {:+}", s.counter_drift);
	}
	for id in &s.connected_not_visited {
		let _ = writeln!(out, "  connected but never visited: {id}");
	}
	out.trim_end().to_string()
}

#[derive(Debug, Serialize)]
struct Membership {
	id: String,
	visited: bool,
	connection_sent: bool,
	message_sent: bool,
}

fn check(store: &StateStore, id: &str) -> Membership {
	Membership {
		id: id.to_string(),
		visited: store.contains(Category::Visited, id),
		connection_sent: store.contains(Category::Connection, id),
		message_sent: store.contains(Category::Message, id),
	}
}

fn render_check(m: &Membership) -> String {
	let mark = |b: bool| if b { "yes" } else { "no" };
	format!(
		"{}\n  visited:         {}\n  connection sent: {}\n  message sent:    {}",
		m.id,
		mark(m.visited),
		mark(m.connection_sent),
		mark(m.message_sent)
	)
}

#[derive(Debug, Serialize)]
struct Forgotten {
	id: String,
	removed: Vec<String>,
}

#[derive(Debug, Serialize)]
struct Pruned {
	cutoff: NaiveDate,
	removed: usize,
}

#[cfg(test)]
mod tests {
	use tempfile::TempDir;

	use super::*;

	#[test]
	fn summary_reports_drift_and_unvisited_connections() {
		let dir = TempDir::new().unwrap();
		let store = StateStore::open(dir.path().join("state.json")).unwrap();
		store.record(Category::Visited, "a").unwrap();
		store.mark_connection_sent("a").unwrap();
		store.mark_connection_sent("b").unwrap();
		store.increment_connection_counter().unwrap();

		let today = NaiveDate::from_ymd_opt(2026, 9, 1).unwrap();
		let summary = summarize(&store, today);
		assert_eq!(summary.connected, 2);
		assert_eq!(summary.connections_total, 3);
		assert_eq!(summary.counter_drift, 1);
		assert_eq!(summary.connected_not_visited, vec!["b".to_string()]);

		let text = render_summary(&summary);
		assert!(text.contains("connected but never visited: b"));
		assert!(text.contains("+1"));
	}

	#[test]
	fn check_reports_each_set() {
		let dir = TempDir::new().unwrap();
		let store = StateStore::open(dir.path().join("state.json")).unwrap();
		store.record(Category::Visited, "p1").unwrap();

		let m = check(&store, "p1");
		assert!(m.visited);
		assert!(!m.connection_sent);
		assert!(!m.message_sent);
		assert!(render_check(&m).contains("visited:         yes"));
	}
}
