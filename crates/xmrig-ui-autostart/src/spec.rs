use std::path::PathBuf;

/// What to autostart. `name` derives the descriptor path and the unit name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceSpec {
	pub name: String,
	pub display_name: String,
	pub description: String,
	pub exec_path: PathBuf,
	/// Positional and order-significant; rendered verbatim into the descriptor.
	pub args: Vec<String>,
	pub working_dir: PathBuf,
	pub user: String,
	/// Seconds; launchd `StartInterval`, systemd `RestartSec`.
	pub delay: u32,
	/// Receives stdout and stderr under launchd.
	pub log_file: PathBuf,
}

impl ServiceSpec {
	/// Executable followed by its arguments, as launchd's `ProgramArguments`.
	pub fn program_arguments(&self) -> Vec<String> {
		let mut argv = Vec::with_capacity(self.args.len() + 1);
		argv.push(self.exec_path.to_string_lossy().into_owned());
		argv.extend(self.args.iter().cloned());
		argv
	}

	/// Space-joined command line. Arguments are not escaped.
	pub fn exec_start(&self) -> String {
		self.program_arguments().join(" ")
	}
}
