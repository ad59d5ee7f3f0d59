use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use sysinfo::{Pid, ProcessesToUpdate, System};

const MIB: u64 = 1024 * 1024;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SystemSnapshot {
	pub platform: &'static str,
	pub arch: &'static str,
	/// Host uptime in seconds.
	pub uptime: u64,
	pub memory: MemorySnapshot,
}

/// Memory figures in MiB.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MemorySnapshot {
	pub total: u64,
	pub available: u64,
	/// Resident memory of the tracked daemon, when it is running.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub daemon: Option<u64>,
}

impl SystemSnapshot {
	pub fn capture(daemon_pid: Option<u32>) -> Self {
		let mut sys = System::new();
		sys.refresh_memory();

		let daemon = daemon_pid.and_then(|pid| {
			let pid = Pid::from_u32(pid);
			sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
			sys.process(pid).map(|p| p.memory() / MIB)
		});

		Self {
			platform: std::env::consts::OS,
			arch: std::env::consts::ARCH,
			uptime: System::uptime(),
			memory: MemorySnapshot {
				total: sys.total_memory() / MIB,
				available: sys.available_memory() / MIB,
				daemon,
			},
		}
	}
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LogFileInfo {
	pub file: PathBuf,
	pub exists: bool,
	/// Size in bytes; zero when the file is missing.
	pub size: u64,
}

impl LogFileInfo {
	pub fn inspect(path: &Path) -> Self {
		let meta = fs::metadata(path).ok();
		Self {
			file: path.to_path_buf(),
			exists: meta.is_some(),
			size: meta.map(|m| m.len()).unwrap_or(0),
		}
	}
}
