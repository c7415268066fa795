mod plan;
mod quota;
mod session;
mod state;

use std::sync::Arc;

use anyhow::{Context, Result};
use outreach::{OutreachLedger, RunConfig, SystemClock};

use crate::cli::{Cli, Commands};

pub fn dispatch(cli: Cli) -> Result<()> {
	let config = cli.files.run_config();
	match cli.command {
		Commands::State { action } => state::run(action, &config, cli.format),
		Commands::Session { action } => session::run(action, &config, cli.format),
		Commands::Quota { action } => quota::run(action, &config, cli.format),
		Commands::Plan { targets } => plan::run(&targets, &config, cli.format),
	}
}

/// Opens the ledger for reading only; a missing state file stays missing.
fn inspect_ledger(config: &RunConfig) -> Result<OutreachLedger> {
	OutreachLedger::inspect(config, Arc::new(SystemClock)).with_context(|| format!("cannot read run state at {}", config.state_file.display()))
}
