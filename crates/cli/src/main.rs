use clap::Parser;
use outreach_cli::{cli::Cli, commands, logging};
use tracing::error;

fn main() {
	// Only a missing .env is fine; a broken one would silently fall back to default limits.
	if let Err(err) = dotenvy::dotenv() {
		if !err.not_found() {
			eprintln!("outreach: cannot load .env: {err}");
			std::process::exit(1);
		}
	}

	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = commands::dispatch(cli) {
		error!(target = "outreach", error = %format!("{err:#}"), "command failed");
		std::process::exit(1);
	}
}
