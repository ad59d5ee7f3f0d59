use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::PidError;
use crate::probe::ProcessProbe;

/// A PID whose process was alive when resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PidRecord {
	pub pid: u32,
	pub alive: bool,
}

/// Single-value PID file at a fixed path.
///
/// There is no locking: one operator at a time is assumed, and two concurrent
/// `start` invocations can both observe an empty store.
#[derive(Debug, Clone)]
pub struct PidStore {
	path: PathBuf,
}

impl PidStore {
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self { path: path.into() }
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Returns the recorded PID, or `None` when no file exists.
	pub fn read(&self) -> Result<Option<u32>, PidError> {
		let content = match fs::read_to_string(&self.path) {
			Ok(c) => c,
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
			Err(source) => {
				return Err(PidError::Read {
					path: self.path.clone(),
					source,
				})
			}
		};
		match content.trim().parse::<u32>() {
			Ok(pid) if pid > 0 => Ok(Some(pid)),
			_ => Err(PidError::Parse {
				path: self.path.clone(),
				content,
			}),
		}
	}

	pub fn write(&self, pid: u32) -> Result<(), PidError> {
		fs::write(&self.path, pid.to_string()).map_err(|source| PidError::Write {
			path: self.path.clone(),
			source,
		})
	}

	/// Removes the file. Removing an absent file is not an error.
	pub fn clear(&self) -> Result<(), PidError> {
		match fs::remove_file(&self.path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
			Err(source) => Err(PidError::Clear {
				path: self.path.clone(),
				source,
			}),
		}
	}

	/// Self-healing read: the only way callers learn whether the daemon runs.
	///
	/// A record whose process is gone, or a file that does not parse, is
	/// removed and reported as absent.
	pub fn resolve(&self, probe: &impl ProcessProbe) -> Option<PidRecord> {
		let pid = match self.read() {
			Ok(Some(pid)) => pid,
			Ok(None) => return None,
			Err(PidError::Parse { content, .. }) => {
				tracing::warn!("discarding unreadable pid file {}: {:?}", self.path.display(), content);
				self.clear_stale();
				return None;
			}
			Err(e) => {
				tracing::warn!("{}", e);
				return None;
			}
		};

		if probe.is_running(pid) {
			return Some(PidRecord { pid, alive: true });
		}

		tracing::info!("removing stale pid file for dead process {}", pid);
		self.clear_stale();
		None
	}

	fn clear_stale(&self) {
		if let Err(e) = self.clear() {
			tracing::warn!("{}", e);
		}
	}
}
