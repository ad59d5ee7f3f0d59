//! Command execution collaborator.
//!
//! Everything that starts an external program goes through [`CommandRunner`]:
//! the build step, the preview server, and the platform service managers.

use std::fmt;
use std::io;
use std::os::unix::process::CommandExt;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};

/// A program, its positional arguments and an optional working directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
	pub program: String,
	pub args: Vec<String>,
	pub cwd: Option<PathBuf>,
}

impl CommandSpec {
	pub fn new(program: impl Into<String>) -> Self {
		Self {
			program: program.into(),
			args: Vec::new(),
			cwd: None,
		}
	}

	/// Builds a spec from an argv-style list; `None` when the list is empty.
	pub fn from_argv(argv: &[String]) -> Option<Self> {
		let (program, args) = argv.split_first()?;
		Some(Self::new(program.clone()).args(args.iter().cloned()))
	}

	pub fn arg(mut self, arg: impl Into<String>) -> Self {
		self.args.push(arg.into());
		self
	}

	pub fn args<I, S>(mut self, args: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.args.extend(args.into_iter().map(Into::into));
		self
	}

	pub fn current_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.cwd = Some(dir.into());
		self
	}

	fn to_command(&self) -> Command {
		let mut cmd = Command::new(&self.program);
		cmd.args(&self.args);
		if let Some(dir) = &self.cwd {
			cmd.current_dir(dir);
		}
		cmd
	}
}

impl fmt::Display for CommandSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.program)?;
		for arg in &self.args {
			write!(f, " {}", arg)?;
		}
		Ok(())
	}
}

/// Whether a synchronous run captures output or streams it to the terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
	Capture,
	Inherit,
}

impl OutputMode {
	pub fn verbose(verbose: bool) -> Self {
		if verbose {
			OutputMode::Inherit
		} else {
			OutputMode::Capture
		}
	}
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
	pub code: Option<i32>,
	pub success: bool,
	pub stdout: String,
	pub stderr: String,
}

/// How a child process ended. `code` is `None` when a signal killed it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Exit {
	pub code: Option<i32>,
}

/// Handle to a spawned child.
pub trait ChildHandle {
	fn id(&self) -> u32;

	/// Reaps the child if it has exited, without blocking.
	fn try_wait(&mut self) -> io::Result<Option<Exit>>;
}

impl ChildHandle for Child {
	fn id(&self) -> u32 {
		Child::id(self)
	}

	fn try_wait(&mut self) -> io::Result<Option<Exit>> {
		Ok(Child::try_wait(self)?.map(|status| Exit { code: status.code() }))
	}
}

pub trait CommandRunner {
	/// Runs to completion.
	fn run(&self, spec: &CommandSpec, mode: OutputMode) -> io::Result<CommandOutput>;

	/// Spawns in its own process group with all stdio discarded.
	fn spawn_detached(&self, spec: &CommandSpec) -> io::Result<Box<dyn ChildHandle>>;

	/// Spawns sharing this process's stdio.
	fn spawn_attached(&self, spec: &CommandSpec) -> io::Result<Box<dyn ChildHandle>>;
}

/// [`CommandRunner`] backed by `std::process`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
	fn run(&self, spec: &CommandSpec, mode: OutputMode) -> io::Result<CommandOutput> {
		tracing::debug!("running {}", spec);
		let mut cmd = spec.to_command();
		match mode {
			OutputMode::Capture => {
				let output = cmd.stdin(Stdio::null()).output()?;
				Ok(CommandOutput {
					code: output.status.code(),
					success: output.status.success(),
					stdout: String::from_utf8_lossy(&output.stdout).to_string(),
					stderr: String::from_utf8_lossy(&output.stderr).to_string(),
				})
			}
			OutputMode::Inherit => {
				let status = cmd.status()?;
				Ok(CommandOutput {
					code: status.code(),
					success: status.success(),
					..CommandOutput::default()
				})
			}
		}
	}

	fn spawn_detached(&self, spec: &CommandSpec) -> io::Result<Box<dyn ChildHandle>> {
		tracing::debug!("spawning detached {}", spec);
		let child = spec
			.to_command()
			.stdin(Stdio::null())
			.stdout(Stdio::null())
			.stderr(Stdio::null())
			.process_group(0)
			.spawn()?;
		Ok(Box::new(child))
	}

	fn spawn_attached(&self, spec: &CommandSpec) -> io::Result<Box<dyn ChildHandle>> {
		tracing::debug!("spawning attached {}", spec);
		let child = spec.to_command().spawn()?;
		Ok(Box::new(child))
	}
}

/// A failed external command, kept for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandFailure {
	pub command: String,
	pub message: String,
}

impl CommandFailure {
	pub fn spawn(spec: &CommandSpec, error: &io::Error) -> Self {
		Self {
			command: spec.to_string(),
			message: error.to_string(),
		}
	}

	pub fn exited(spec: &CommandSpec, output: &CommandOutput) -> Self {
		let stderr = output.stderr.trim();
		let message = if !stderr.is_empty() {
			stderr.to_string()
		} else {
			match output.code {
				Some(code) => format!("exited with status {}", code),
				None => "terminated by signal".to_string(),
			}
		};
		Self {
			command: spec.to_string(),
			message,
		}
	}
}

impl fmt::Display for CommandFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "`{}`: {}", self.command, self.message)
	}
}

impl std::error::Error for CommandFailure {}

/// Runs `spec` and folds spawn errors and non-zero exits into one failure.
pub fn run_checked(
	runner: &dyn CommandRunner,
	spec: &CommandSpec,
	mode: OutputMode,
) -> Result<CommandOutput, CommandFailure> {
	match runner.run(spec, mode) {
		Ok(output) if output.success => Ok(output),
		Ok(output) => Err(CommandFailure::exited(spec, &output)),
		Err(e) => Err(CommandFailure::spawn(spec, &e)),
	}
}
