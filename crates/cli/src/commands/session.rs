use std::fmt::Write as _;

use anyhow::{Context, Result};
use chrono::Utc;
use outreach::session::{is_expired_at, is_session_cookie};
use outreach::{Cookie, RunConfig, SessionStore};
use serde::Serialize;

use crate::cli::SessionAction;
use crate::output::{OutputFormat, emit};

pub fn run(action: SessionAction, config: &RunConfig, format: OutputFormat) -> Result<()> {
	let store = SessionStore::new(&config.session_file);

	match action {
		SessionAction::Show => {
			let cookies = store
				.load()
				.with_context(|| format!("cannot read saved session at {}", store.path().display()))?;
			let data = describe(&store, cookies, Utc::now().timestamp());
			emit(format, "session.show", &data, render)
		}
		SessionAction::Clear => {
			let removed = store.clear()?;
			let path = store.path().display().to_string();
			emit(format, "session.clear", &serde_json::json!({ "removed": removed, "path": path }), |_| {
				if removed {
					format!("Removed saved session {path}")
				} else {
					format!("No saved session at {path}")
				}
			})
		}
	}
}

#[derive(Debug, Serialize)]
struct CookieSummary {
	name: String,
	domain: String,
	expires: String,
	expired: bool,
}

#[derive(Debug, Serialize)]
struct SessionSummary {
	path: String,
	saved: bool,
	cookies: Vec<CookieSummary>,
	/// Restoring never checks expiry; this only tells whether a fresh login is likely.
	all_expired: bool,
}

fn describe(store: &SessionStore, cookies: Option<Vec<Cookie>>, now: i64) -> SessionSummary {
	let saved = cookies.is_some();
	let cookies: Vec<CookieSummary> = cookies
		.unwrap_or_default()
		.iter()
		.map(|cookie| CookieSummary {
			name: cookie.name.clone(),
			domain: cookie.domain.clone(),
			expires: format_expiry(cookie, now),
			expired: is_expired_at(cookie, now),
		})
		.collect();

	SessionSummary {
		path: store.path().display().to_string(),
		saved,
		all_expired: !cookies.is_empty() && cookies.iter().all(|c| c.expired),
		cookies,
	}
}

fn render(s: &SessionSummary) -> String {
	if !s.saved {
		return format!("No saved session at {} (next run logs in from scratch)", s.path);
	}

	let mut out = String::new();
	let _ = writeln!(out, "Saved session: {}", s.path);
	let _ = writeln!(out);
	let _ = writeln!(out, "COOKIES ({}):", s.cookies.len());
	if s.cookies.is_empty() {
		let _ = writeln!(out, "  (none)");
	} else {
		let _ = writeln!(out, "  {:<20} {:<30} {:<20}", "NAME", "DOMAIN", "EXPIRES");
		let _ = writeln!(out, "  {}", "-".repeat(70));
		for cookie in &s.cookies {
			let domain = if cookie.domain.is_empty() { "-" } else { cookie.domain.as_str() };
			let _ = writeln!(out, "  {:<20} {:<30} {:<20}", cookie.name, domain, cookie.expires);
		}
	}
	if s.all_expired {
		let _ = writeln!(out, "\nEvery cookie has expired; expect a full login.");
	}
	out.trim_end().to_string()
}

fn format_expiry(cookie: &Cookie, now: i64) -> String {
	if is_session_cookie(cookie) {
		return "session".into();
	}
	if is_expired_at(cookie, now) {
		return "expired".into();
	}

	let diff = cookie.expires.map(|ts| ts as i64 - now).unwrap_or_default();
	match diff {
		d if d < 3600 => format!("{}m", d / 60),
		d if d < 86400 => format!("{}h", d / 3600),
		d => format!("{}d", d / 86400),
	}
}
