use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use outreach::config::{DEFAULT_DAILY_CONNECTION_LIMIT, DEFAULT_SESSION_FILE, DEFAULT_STATE_FILE};
use outreach::{Category, RunConfig};

use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "outreach")]
#[command(about = "Inspect and maintain outreach run state, saved sessions and daily quotas")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Output format
	#[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
	pub format: OutputFormat,

	#[command(flatten)]
	pub files: FileArgs,

	#[command(subcommand)]
	pub command: Commands,
}

/// Locations and limits shared by every command.
#[derive(Args, Debug, Clone)]
pub struct FileArgs {
	/// Run-state file (visited / connected / messaged targets)
	#[arg(long = "state", global = true, value_name = "FILE", env = "OUTREACH_STATE_FILE", default_value = DEFAULT_STATE_FILE)]
	pub state_file: PathBuf,

	/// Saved session cookie file
	#[arg(long = "session", global = true, value_name = "FILE", env = "OUTREACH_SESSION_FILE", default_value = DEFAULT_SESSION_FILE)]
	pub session_file: PathBuf,

	/// Connection requests allowed per calendar day
	#[arg(long, global = true, env = "DAILY_CONNECTION_LIMIT", default_value_t = DEFAULT_DAILY_CONNECTION_LIMIT)]
	pub daily_connection_limit: u32,

	/// Follow-up messages allowed per calendar day (ungated when unset)
	#[arg(long, global = true, env = "DAILY_MESSAGE_LIMIT")]
	pub daily_message_limit: Option<u32>,
}

impl FileArgs {
	pub fn run_config(&self) -> RunConfig {
		RunConfig {
			state_file: self.state_file.clone(),
			session_file: self.session_file.clone(),
			daily_connection_limit: self.daily_connection_limit,
			daily_message_limit: self.daily_message_limit,
			..RunConfig::default()
		}
	}
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Run-state ledger
	State {
		#[command(subcommand)]
		action: StateAction,
	},

	/// Saved browser session
	Session {
		#[command(subcommand)]
		action: SessionAction,
	},

	/// Daily quota usage
	Quota {
		#[command(subcommand)]
		action: QuotaAction,
	},

	/// Preview which targets the next run would contact (read-only)
	Plan {
		/// File with one target identifier per line (`#` starts a comment)
		#[arg(long, value_name = "FILE")]
		targets: PathBuf,
	},
}

#[derive(Subcommand, Debug)]
pub enum StateAction {
	/// Summarize the ledger and report inconsistencies
	Show,

	/// Show which sets contain a target
	Check { id: String },

	/// Remove a target from one set, or from all of them
	Forget {
		id: String,
		#[arg(long, value_enum)]
		category: Option<CategoryArg>,
	},

	/// Drop per-day counts older than N days
	Prune {
		#[arg(long, default_value_t = 30)]
		keep_days: u32,
	},
}

#[derive(Subcommand, Debug)]
pub enum SessionAction {
	/// List saved cookies with expiry
	Show,

	/// Delete the saved session, forcing a fresh login next run
	Clear,
}

#[derive(Subcommand, Debug)]
pub enum QuotaAction {
	/// Today's usage per action kind
	Status,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum CategoryArg {
	Visited,
	Connection,
	Message,
}

impl From<CategoryArg> for Category {
	fn from(arg: CategoryArg) -> Self {
		match arg {
			CategoryArg::Visited => Category::Visited,
			CategoryArg::Connection => Category::Connection,
			CategoryArg::Message => Category::Message,
		}
	}
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn cli_definition_is_valid() {
		Cli::command().debug_assert();
	}

	#[test]
	fn global_file_flags_after_subcommand() {
		let cli = Cli::try_parse_from(["outreach", "state", "show", "--state", "/tmp/s.json", "--daily-connection-limit", "5"]).unwrap();
		assert_eq!(cli.files.state_file, PathBuf::from("/tmp/s.json"));
		assert_eq!(cli.files.run_config().daily_connection_limit, 5);
		assert!(matches!(cli.command, Commands::State { action: StateAction::Show }));
	}

	#[test]
	fn forget_accepts_category() {
		let cli = Cli::try_parse_from(["outreach", "state", "forget", "p1", "--category", "message"]).unwrap();
		let Commands::State {
			action: StateAction::Forget { id, category },
		} = cli.command
		else {
			panic!("expected state forget");
		};
		assert_eq!(id, "p1");
		assert_eq!(category.map(Category::from), Some(Category::Message));
	}
}
