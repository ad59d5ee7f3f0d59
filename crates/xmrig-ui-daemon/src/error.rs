use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::exec::CommandFailure;

/// Failures touching the PID file.
#[derive(Debug, Error)]
pub enum PidError {
	#[error("failed to read pid file {path:?}: {source}")]
	Read {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("pid file {path:?} does not hold a process id: {content:?}")]
	Parse { path: PathBuf, content: String },
	#[error("failed to write pid file {path:?}: {source}")]
	Write {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("failed to remove pid file {path:?}: {source}")]
	Clear {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

/// Errors raised by daemon lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
	#[error("build failed: {0}")]
	Build(CommandFailure),
	#[error("failed to start daemon: process {pid} exited immediately")]
	DaemonStart { pid: u32 },
	#[error("failed to spawn {program}: {source}")]
	Spawn {
		program: String,
		#[source]
		source: io::Error,
	},
	#[error("failed to register signal forwarding: {0}")]
	Signals(#[source] io::Error),
	#[error("failed to wait for preview process {pid}: {source}")]
	Monitor {
		pid: u32,
		#[source]
		source: io::Error,
	},
	#[error(transparent)]
	Pid(#[from] PidError),
}
