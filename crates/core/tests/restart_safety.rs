use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use outreach::{
	ActionKind, Admission, Campaign, Category, Clock, Cookie, DriverError, DriverOutcome, FixedClock, OutreachDriver, OutreachLedger, RunConfig, SameSite,
	SessionStore, StateStore,
};
use tempfile::TempDir;

struct CountingDriver {
	connects: usize,
}

#[async_trait]
impl OutreachDriver for CountingDriver {
	async fn send_connection(&mut self, _target: &str, _note: Option<&str>) -> Result<DriverOutcome, DriverError> {
		self.connects += 1;
		Ok(DriverOutcome::Sent)
	}

	async fn send_message(&mut self, _target: &str, _text: &str) -> Result<DriverOutcome, DriverError> {
		Ok(DriverOutcome::Sent)
	}
}

fn config(dir: &TempDir, limit: u32) -> RunConfig {
	RunConfig {
		state_file: dir.path().join("data").join("state.json"),
		session_file: dir.path().join("data").join("cookies.json"),
		daily_connection_limit: limit,
		..RunConfig::default()
	}
}

fn day(d: u32) -> NaiveDate {
	NaiveDate::from_ymd_opt(2026, 8, d).expect("valid date")
}

fn profiles(n: usize) -> Vec<String> {
	(0..n).map(|i| format!("https://www.linkedin.com/in/person-{i}")).collect()
}

#[tokio::test]
async fn restarted_run_neither_recontacts_nor_resets_daily_quota() {
	let dir = TempDir::new().expect("temp dir should be created");
	let config = config(&dir, 3);
	let clock = Arc::new(FixedClock::new(day(10)));
	let targets = profiles(5);

	{
		let ledger = OutreachLedger::open(&config, clock.clone()).expect("ledger should open");
		let mut campaign = Campaign::new(&ledger, CountingDriver { connects: 0 }, &config);
		let report = campaign.run(&targets[..2]).await.expect("first run should succeed");
		assert_eq!(report.connections.sent, 2);
	}

	let ledger = OutreachLedger::open(&config, clock.clone()).expect("ledger should reopen");
	let mut campaign = Campaign::new(&ledger, CountingDriver { connects: 0 }, &config);
	let report = campaign.run(&targets).await.expect("second run should succeed");

	assert_eq!(report.connections.already_done, 2);
	assert_eq!(report.connections.sent, 1, "only one connection left in today's allowance");
	assert!(report.connections.quota_exhausted);
	assert_eq!(campaign.into_driver().connects, 1);

	clock.set(day(11));
	let mut campaign = Campaign::new(&ledger, CountingDriver { connects: 0 }, &config);
	let report = campaign.run(&targets).await.expect("next-day run should succeed");
	assert_eq!(report.connections.sent, 2);
	assert_eq!(ledger.state().snapshot().connections_total, 5);
}

#[test]
fn state_round_trip_preserves_memberships_and_counter() -> anyhow::Result<()> {
	let dir = TempDir::new()?;
	let path = dir.path().join("state.json");

	let store = StateStore::open(&path)?;
	for id in ["a", "b", "c"] {
		store.record(Category::Visited, id)?;
	}
	store.mark_connection_sent("a")?;
	store.mark_connection_sent("b")?;
	store.record(Category::Message, "a")?;
	let written = store.snapshot();
	drop(store);

	let reloaded = StateStore::open(&path)?.snapshot();
	assert_eq!(reloaded, written);
	assert!(reloaded.consistency_report().is_clean());
	Ok(())
}

#[test]
fn session_round_trip_is_field_wise_equal_ignoring_order() {
	let dir = TempDir::new().expect("temp dir should be created");
	let store = SessionStore::new(dir.path().join("cookies.json"));
	let cookies = vec![
		Cookie {
			name: "li_at".into(),
			value: "AQED".into(),
			domain: ".www.linkedin.com".into(),
			path: "/".into(),
			expires: Some(1_893_456_000.0),
			http_only: true,
			secure: true,
			same_site: Some(SameSite::None),
		},
		Cookie {
			name: "lang".into(),
			value: "v=2&lang=en-us".into(),
			domain: ".linkedin.com".into(),
			path: "/".into(),
			expires: None,
			http_only: false,
			secure: true,
			same_site: Some(SameSite::Strict),
		},
		Cookie {
			name: "lang".into(),
			value: "duplicate".into(),
			domain: ".linkedin.com".into(),
			path: "/".into(),
			expires: None,
			http_only: false,
			secure: false,
			same_site: None,
		},
	];

	store.save(&cookies).expect("save should succeed");
	let loaded = store.load().expect("load should succeed").expect("file should exist");

	let key = |c: &Cookie| serde_json::to_string(c).expect("cookie encodes");
	let expected: HashSet<String> = cookies.iter().map(key).collect();
	let actual: HashSet<String> = loaded.iter().map(key).collect();
	assert_eq!(loaded.len(), cookies.len());
	assert_eq!(actual, expected);
}

#[test]
fn corrupt_state_aborts_open_and_keeps_file() {
	let dir = TempDir::new().expect("temp dir should be created");
	let config = config(&dir, 3);
	std::fs::create_dir_all(config.state_file.parent().expect("parent")).expect("data dir");
	std::fs::write(&config.state_file, "{\"visited_profiles\": {\"p1\": tru").expect("write partial file");

	let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(day(1)));
	let err = OutreachLedger::open(&config, clock).err().expect("open should fail");
	assert!(err.is_format());
	assert_eq!(
		std::fs::read_to_string(&config.state_file).expect("file still there"),
		"{\"visited_profiles\": {\"p1\": tru"
	);
}

#[test]
fn zero_limit_denies_first_admission() {
	let dir = TempDir::new().expect("temp dir should be created");
	let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(day(1)));
	let ledger = OutreachLedger::open(&config(&dir, 0), clock).expect("ledger should open");
	assert_eq!(ledger.admit(ActionKind::Connection).expect("admit"), Admission::Denied);
}
