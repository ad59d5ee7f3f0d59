pub mod autostart;
pub mod daemon;

use std::io;
use std::process::ExitCode;

use thiserror::Error;
use xmrig_ui_autostart::AutostartError;
use xmrig_ui_daemon::{DaemonLifecycle, LifecycleError, RuntimePaths};

use crate::config::{Config, ConfigError};
use crate::output::Output;

/// Base name of the PID and log files in the temp directory.
pub const RUNTIME_NAME: &str = "xmrig-web-ui";

#[derive(Debug, Error)]
pub enum CommandError {
	#[error(transparent)]
	Lifecycle(#[from] LifecycleError),
	#[error(transparent)]
	Autostart(#[from] AutostartError),
	#[error(transparent)]
	Config(#[from] ConfigError),
	#[error("cannot determine home directory: HOME is not set")]
	NoHome,
	#[error("cannot locate the xmrig-ui executable: {0}")]
	CurrentExe(#[source] io::Error),
}

/// What every command needs: configuration, presentation and verbosity.
pub struct Context {
	pub config: Config,
	pub out: Output,
	pub verbose: bool,
}

impl Context {
	pub fn runtime_paths(&self) -> RuntimePaths {
		RuntimePaths::new(RUNTIME_NAME)
	}

	pub fn lifecycle(&self) -> Result<DaemonLifecycle, CommandError> {
		let plan = self.config.preview.plan()?;
		Ok(DaemonLifecycle::new(self.runtime_paths(), plan))
	}
}

pub fn exit_code(code: i32) -> ExitCode {
	u8::try_from(code).map(ExitCode::from).unwrap_or(ExitCode::FAILURE)
}
