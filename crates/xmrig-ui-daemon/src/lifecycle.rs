//! Start, stop, restart and status for the preview server.
//!
//! Every operation learns whether the daemon runs through
//! [`PidStore::resolve`]; the daemon-mode child talks to later invocations
//! only through signals and the PID file.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::error::LifecycleError;
use crate::exec::{self, CommandRunner, CommandSpec, OutputMode, SystemRunner};
use crate::metrics::{LogFileInfo, SystemSnapshot};
use crate::paths::RuntimePaths;
use crate::pid::PidStore;
use crate::probe::{ProcessProbe, SignalProbe, StopSignal};
use crate::signals::{Interrupt, SignalSubscription};

pub const SETTLE_DELAY: Duration = Duration::from_millis(2000);
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);
pub const POLL_ATTEMPTS: u32 = 10;
pub const KILL_SETTLE: Duration = Duration::from_millis(1000);
pub const RESTART_PAUSE: Duration = Duration::from_millis(1000);
const FOREGROUND_TICK: Duration = Duration::from_millis(100);

/// Waits used by the lifecycle. `Default` holds the operator-facing constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
	pub settle: Duration,
	pub poll_interval: Duration,
	pub poll_attempts: u32,
	pub kill_settle: Duration,
	pub restart_pause: Duration,
	pub foreground_tick: Duration,
}

impl Default for Timings {
	fn default() -> Self {
		Self {
			settle: SETTLE_DELAY,
			poll_interval: POLL_INTERVAL,
			poll_attempts: POLL_ATTEMPTS,
			kill_settle: KILL_SETTLE,
			restart_pause: RESTART_PAUSE,
			foreground_tick: FOREGROUND_TICK,
		}
	}
}

impl Timings {
	/// No waiting at all; the poll budget is kept.
	pub fn immediate() -> Self {
		Self {
			settle: Duration::ZERO,
			poll_interval: Duration::ZERO,
			poll_attempts: POLL_ATTEMPTS,
			kill_settle: Duration::ZERO,
			restart_pause: Duration::ZERO,
			foreground_tick: Duration::from_millis(1),
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DaemonState {
	Stopped,
	Starting,
	Running,
	Stopping,
}

impl fmt::Display for DaemonState {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			DaemonState::Stopped => "stopped",
			DaemonState::Starting => "starting",
			DaemonState::Running => "running",
			DaemonState::Stopping => "stopping",
		})
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
	pub host: String,
	pub port: u16,
}

impl Endpoint {
	pub fn new(host: impl Into<String>, port: u16) -> Self {
		Self {
			host: host.into(),
			port,
		}
	}

	/// Browser URL; a wildcard bind address is shown as `localhost`.
	pub fn url(&self) -> String {
		let host = if self.host == "0.0.0.0" {
			"localhost"
		} else {
			self.host.as_str()
		};
		format!("http://{}:{}", host, self.port)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
	Daemon,
	Foreground,
}

#[derive(Debug, Clone)]
pub struct StartOptions {
	pub endpoint: Endpoint,
	pub mode: RunMode,
	/// Stream build output to the terminal.
	pub verbose: bool,
}

/// What gets built and run, relative to the web project.
#[derive(Debug, Clone)]
pub struct PreviewPlan {
	pub project_dir: PathBuf,
	/// Build artefacts; an absent or empty directory triggers a build.
	pub dist_dir: PathBuf,
	pub build: CommandSpec,
	/// Preview command without the `--port`/`--host` suffix.
	pub preview: CommandSpec,
}

impl PreviewPlan {
	pub fn build_command(&self) -> CommandSpec {
		self.build.clone().current_dir(&self.project_dir)
	}

	pub fn preview_command(&self, endpoint: &Endpoint) -> CommandSpec {
		self.preview
			.clone()
			.args(["--port".to_string(), endpoint.port.to_string()])
			.args(["--host".to_string(), endpoint.host.clone()])
			.current_dir(&self.project_dir)
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
	AlreadyRunning { pid: u32 },
	/// Daemon mode: the child survived the settle window.
	Started { pid: u32 },
	/// Foreground mode: the child ended; `code` is `None` after a signal.
	Exited { code: Option<i32> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
	NotRunning,
	Stopped { pid: u32, forced: bool },
	/// Still alive after SIGKILL. The PID file is gone regardless.
	Survived { pid: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestartOutcome {
	pub stop: StopOutcome,
	pub start: StartOutcome,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ServiceStatus {
	Running { pid: u32, url: String },
	Stopped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
	pub service: ServiceStatus,
	pub system: SystemSnapshot,
	pub logs: LogFileInfo,
}

pub struct DaemonLifecycle<P = SignalProbe, R = SystemRunner> {
	probe: P,
	runner: R,
	paths: RuntimePaths,
	pids: PidStore,
	plan: PreviewPlan,
	timings: Timings,
}

impl DaemonLifecycle {
	pub fn new(paths: RuntimePaths, plan: PreviewPlan) -> Self {
		Self::with_collaborators(SignalProbe, SystemRunner, paths, plan)
	}
}

impl<P: ProcessProbe, R: CommandRunner> DaemonLifecycle<P, R> {
	pub fn with_collaborators(probe: P, runner: R, paths: RuntimePaths, plan: PreviewPlan) -> Self {
		let pids = PidStore::new(paths.pid_path());
		Self {
			probe,
			runner,
			paths,
			pids,
			plan,
			timings: Timings::default(),
		}
	}

	pub fn with_timings(mut self, timings: Timings) -> Self {
		self.timings = timings;
		self
	}

	pub fn paths(&self) -> &RuntimePaths {
		&self.paths
	}

	pub fn pid_store(&self) -> &PidStore {
		&self.pids
	}

	pub fn probe(&self) -> &P {
		&self.probe
	}

	pub fn runner(&self) -> &R {
		&self.runner
	}

	pub fn start(&self, options: &StartOptions) -> Result<StartOutcome, LifecycleError> {
		self.start_observed(options, &mut |_: Interrupt| {})
	}

	/// Like [`start`](Self::start); `on_interrupt` hears every interrupt a
	/// foreground run forwards to its child.
	pub fn start_observed(
		&self,
		options: &StartOptions,
		on_interrupt: &mut dyn FnMut(Interrupt),
	) -> Result<StartOutcome, LifecycleError> {
		if let Some(record) = self.pids.resolve(&self.probe) {
			tracing::info!("preview server already running (pid {})", record.pid);
			return Ok(StartOutcome::AlreadyRunning { pid: record.pid });
		}

		self.ensure_build(options.verbose)?;

		let preview = self.plan.preview_command(&options.endpoint);
		match options.mode {
			RunMode::Daemon => self.start_daemon(&preview),
			RunMode::Foreground => self.run_foreground(&preview, on_interrupt),
		}
	}

	fn ensure_build(&self, verbose: bool) -> Result<(), LifecycleError> {
		if dir_has_entries(&self.plan.dist_dir) {
			return Ok(());
		}
		tracing::info!("{} is missing or empty, building", self.plan.dist_dir.display());
		exec::run_checked(&self.runner, &self.plan.build_command(), OutputMode::verbose(verbose))
			.map_err(LifecycleError::Build)?;
		Ok(())
	}

	fn start_daemon(&self, preview: &CommandSpec) -> Result<StartOutcome, LifecycleError> {
		self.enter(DaemonState::Starting);
		let mut child = self.runner.spawn_detached(preview).map_err(|source| LifecycleError::Spawn {
			program: preview.program.clone(),
			source,
		})?;
		let pid = child.id();

		if let Err(e) = self.pids.write(pid) {
			self.probe.kill(pid, StopSignal::Terminate);
			return Err(e.into());
		}

		thread::sleep(self.timings.settle);

		// Reaping first keeps an exited child from lingering as a zombie that
		// still answers the liveness probe.
		let exited = matches!(child.try_wait(), Ok(Some(_)));
		if exited || !self.probe.is_running(pid) {
			if let Err(e) = self.pids.clear() {
				tracing::warn!("{}", e);
			}
			self.enter(DaemonState::Stopped);
			return Err(LifecycleError::DaemonStart { pid });
		}

		drop(child);
		self.enter(DaemonState::Running);
		Ok(StartOutcome::Started { pid })
	}

	fn run_foreground(
		&self,
		preview: &CommandSpec,
		on_interrupt: &mut dyn FnMut(Interrupt),
	) -> Result<StartOutcome, LifecycleError> {
		let signals = SignalSubscription::register().map_err(LifecycleError::Signals)?;
		let mut child = self.runner.spawn_attached(preview).map_err(|source| LifecycleError::Spawn {
			program: preview.program.clone(),
			source,
		})?;
		let pid = child.id();
		self.enter(DaemonState::Running);

		loop {
			match child.try_wait() {
				Ok(Some(exit)) => {
					self.enter(DaemonState::Stopped);
					return Ok(StartOutcome::Exited { code: exit.code });
				}
				Ok(None) => {}
				Err(source) => return Err(LifecycleError::Monitor { pid, source }),
			}
			if let Some(interrupt) = signals.take() {
				tracing::info!("forwarding {:?} to preview process {} as SIGTERM", interrupt, pid);
				on_interrupt(interrupt);
				self.probe.kill(pid, StopSignal::Terminate);
			}
			thread::sleep(self.timings.foreground_tick);
		}
	}

	/// SIGTERM, poll, then SIGKILL. Worst case is poll budget plus kill settle.
	pub fn stop(&self) -> Result<StopOutcome, LifecycleError> {
		let Some(record) = self.pids.resolve(&self.probe) else {
			return Ok(StopOutcome::NotRunning);
		};
		let pid = record.pid;
		self.enter(DaemonState::Stopping);

		self.probe.kill(pid, StopSignal::Terminate);
		let mut attempts = 0;
		while self.probe.is_running(pid) && attempts < self.timings.poll_attempts {
			thread::sleep(self.timings.poll_interval);
			attempts += 1;
		}

		let mut forced = false;
		if self.probe.is_running(pid) {
			tracing::warn!("pid {} still running after {} checks, sending SIGKILL", pid, attempts);
			self.probe.kill(pid, StopSignal::Kill);
			forced = true;
			thread::sleep(self.timings.kill_settle);
		}

		self.pids.clear()?;

		if forced && self.probe.is_running(pid) {
			tracing::warn!("pid {} survived SIGKILL", pid);
			return Ok(StopOutcome::Survived { pid });
		}
		self.enter(DaemonState::Stopped);
		Ok(StopOutcome::Stopped { pid, forced })
	}

	/// Stops, pauses, then starts in daemon mode whatever `options.mode` says.
	pub fn restart(&self, options: &StartOptions) -> Result<RestartOutcome, LifecycleError> {
		let stop = self.stop()?;
		thread::sleep(self.timings.restart_pause);
		let options = StartOptions {
			mode: RunMode::Daemon,
			..options.clone()
		};
		let start = self.start(&options)?;
		Ok(RestartOutcome { stop, start })
	}

	pub fn status(&self, endpoint: &Endpoint) -> StatusReport {
		let record = self.pids.resolve(&self.probe);
		let service = match record {
			Some(r) => ServiceStatus::Running {
				pid: r.pid,
				url: endpoint.url(),
			},
			None => ServiceStatus::Stopped,
		};
		StatusReport {
			service,
			system: SystemSnapshot::capture(record.map(|r| r.pid)),
			logs: LogFileInfo::inspect(&self.paths.log_path()),
		}
	}

	fn enter(&self, state: DaemonState) {
		tracing::debug!(%state, "daemon lifecycle");
	}
}

fn dir_has_entries(dir: &Path) -> bool {
	fs::read_dir(dir)
		.map(|mut entries| entries.next().is_some())
		.unwrap_or(false)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_timings_match_operator_expectations() {
		let t = Timings::default();
		assert_eq!(t.settle, Duration::from_millis(2000));
		assert_eq!(t.poll_interval, Duration::from_millis(500));
		assert_eq!(t.poll_attempts, 10);
		assert_eq!(t.kill_settle, Duration::from_millis(1000));
		assert_eq!(t.restart_pause, Duration::from_millis(1000));
		// worst-case stop latency
		assert_eq!(t.poll_interval * t.poll_attempts + t.kill_settle, Duration::from_secs(6));
	}

	#[test]
	fn wildcard_host_is_shown_as_localhost() {
		assert_eq!(Endpoint::new("0.0.0.0", 4173).url(), "http://localhost:4173");
		assert_eq!(Endpoint::new("192.168.1.5", 8080).url(), "http://192.168.1.5:8080");
	}

	#[test]
	fn preview_command_appends_endpoint() {
		let plan = PreviewPlan {
			project_dir: PathBuf::from("/srv/ui"),
			dist_dir: PathBuf::from("/srv/ui/dist"),
			build: CommandSpec::new("npm").args(["run", "build"]),
			preview: CommandSpec::new("npm").args(["run", "preview", "--"]),
		};
		let cmd = plan.preview_command(&Endpoint::new("0.0.0.0", 4173));
		assert_eq!(cmd.to_string(), "npm run preview -- --port 4173 --host 0.0.0.0");
		assert_eq!(cmd.cwd.as_deref(), Some(Path::new("/srv/ui")));
		assert_eq!(plan.build_command().cwd.as_deref(), Some(Path::new("/srv/ui")));
	}

	#[test]
	fn stopped_status_has_no_pid() {
		let json = serde_json::to_value(ServiceStatus::Stopped).unwrap();
		assert_eq!(json, serde_json::json!({ "status": "stopped" }));

		let json = serde_json::to_value(ServiceStatus::Running {
			pid: 7,
			url: "http://localhost:4173".into(),
		})
		.unwrap();
		assert_eq!(json["status"], "running");
		assert_eq!(json["pid"], 7);
	}

	#[test]
	fn empty_or_missing_dist_needs_build() {
		let dir = tempfile::tempdir().unwrap();
		assert!(!dir_has_entries(&dir.path().join("dist")));
		fs::create_dir(dir.path().join("dist")).unwrap();
		assert!(!dir_has_entries(&dir.path().join("dist")));
		fs::write(dir.path().join("dist").join("index.html"), "<html/>").unwrap();
		assert!(dir_has_entries(&dir.path().join("dist")));
	}
}
