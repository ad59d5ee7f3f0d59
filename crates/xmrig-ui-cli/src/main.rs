mod cli;
mod commands;
mod config;
mod output;

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{AutostartCommand, Cli, Command};
use commands::Context;
use output::Output;

fn main() -> ExitCode {
	let cli = Cli::parse();
	init_logging(&cli);

	let ctx = Context {
		config: config::load_config(),
		out: Output::new(cli.json, cli.quiet),
		verbose: cli.verbose,
	};

	let result = match &cli.command {
		Command::Start { endpoint, daemon } => commands::daemon::start(&ctx, endpoint, *daemon),
		Command::Stop => commands::daemon::stop(&ctx),
		Command::Restart { endpoint } => commands::daemon::restart(&ctx, endpoint),
		Command::Status => commands::daemon::status(&ctx),
		Command::Autostart { command } => match command {
			AutostartCommand::Enable { endpoint, delay } => commands::autostart::enable(&ctx, endpoint, *delay),
			AutostartCommand::Disable => commands::autostart::disable(&ctx),
			AutostartCommand::Status => commands::autostart::status(&ctx),
		},
	};

	match result {
		Ok(code) => code,
		Err(e) => {
			tracing::debug!("{:?}", e);
			ctx.out.fatal(&e.to_string());
			ExitCode::FAILURE
		}
	}
}

/// Logs go to stderr so JSON on stdout stays clean.
fn init_logging(cli: &Cli) {
	let default = if cli.verbose {
		"debug"
	} else if cli.quiet {
		"error"
	} else {
		"warn"
	};
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.init();
}
