use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "xmrig-ui", about = "Run and supervise the XMRig Web UI preview server")]
#[command(version, propagate_version = true)]
pub struct Cli {
	#[command(subcommand)]
	pub command: Command,

	/// Print one JSON object instead of text
	#[arg(short, long, global = true)]
	pub json: bool,

	/// Only print essential output
	#[arg(short, long, global = true, conflicts_with = "verbose")]
	pub quiet: bool,

	/// Debug logging and streamed build/service-manager output
	#[arg(long, global = true)]
	pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Start the preview server
	Start {
		#[command(flatten)]
		endpoint: EndpointArgs,
		/// Detach and run in the background
		#[arg(short, long)]
		daemon: bool,
	},
	/// Stop the background preview server
	Stop,
	/// Stop, then start in the background
	Restart {
		#[command(flatten)]
		endpoint: EndpointArgs,
	},
	/// Show server, system and log status
	Status,
	/// Start the server at login
	Autostart {
		#[command(subcommand)]
		command: AutostartCommand,
	},
}

#[derive(Subcommand, Debug)]
pub enum AutostartCommand {
	/// Install and register the service descriptor
	Enable {
		#[command(flatten)]
		endpoint: EndpointArgs,
		/// Restart delay in seconds
		#[arg(long)]
		delay: Option<u32>,
	},
	/// Unregister and remove the service descriptor
	Disable,
	/// Report whether autostart is installed
	Status,
}

#[derive(Args, Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointArgs {
	/// Port to listen on
	#[arg(short, long)]
	pub port: Option<u16>,
	/// Address to bind
	#[arg(short = 'H', long)]
	pub host: Option<String>,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn start_flags() {
		let cli = Cli::try_parse_from(["xmrig-ui", "start", "-d", "-p", "8080", "-H", "127.0.0.1"]).unwrap();
		match cli.command {
			Command::Start { endpoint, daemon } => {
				assert!(daemon);
				assert_eq!(endpoint.port, Some(8080));
				assert_eq!(endpoint.host.as_deref(), Some("127.0.0.1"));
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn global_flags_after_subcommand() {
		let cli = Cli::try_parse_from(["xmrig-ui", "status", "--json", "-q"]).unwrap();
		assert!(cli.json);
		assert!(cli.quiet);
		assert!(matches!(cli.command, Command::Status));
	}

	#[test]
	fn quiet_conflicts_with_verbose() {
		assert!(Cli::try_parse_from(["xmrig-ui", "stop", "-q", "--verbose"]).is_err());
	}

	#[test]
	fn autostart_enable_delay() {
		let cli = Cli::try_parse_from(["xmrig-ui", "autostart", "enable", "--delay", "30", "--port", "9000"]).unwrap();
		match cli.command {
			Command::Autostart {
				command: AutostartCommand::Enable { endpoint, delay },
			} => {
				assert_eq!(delay, Some(30));
				assert_eq!(endpoint.port, Some(9000));
				assert_eq!(endpoint.host, None);
			}
			other => panic!("unexpected command: {other:?}"),
		}
	}

	#[test]
	fn parser_is_well_formed() {
		use clap::CommandFactory;
		Cli::command().debug_assert();
	}
}
