use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use xmrig_ui_daemon::exec::{self, CommandFailure, CommandRunner, CommandSpec, OutputMode, SystemRunner};

use crate::descriptor::{self, DescriptorFormat};
use crate::error::AutostartError;
use crate::platform::Platform;
use crate::spec::ServiceSpec;

const SYSTEMD_SERVICE_TYPE: &str = "systemd user service";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutostartState {
	Absent,
	InstalledInactive,
	InstalledActive,
}

/// Result of a status query. Linux reports `enabled` and `active`
/// separately; elsewhere only `enabled` is known.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct AutostartStatus {
	pub enabled: bool,
	pub platform: Platform,
	pub service: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub active: Option<bool>,
	#[serde(rename = "type", skip_serializing_if = "Option::is_none")]
	pub kind: Option<&'static str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub file: Option<PathBuf>,
	/// The descriptor file exists, whatever the service manager says.
	#[serde(skip)]
	installed: bool,
}

impl AutostartStatus {
	/// A unit can be active without being enabled, so only a missing
	/// descriptor counts as absent.
	pub fn state(&self) -> AutostartState {
		match (self.installed, self.active) {
			(false, _) => AutostartState::Absent,
			(true, Some(true)) => AutostartState::InstalledActive,
			(true, _) => AutostartState::InstalledInactive,
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnableReport {
	pub platform: Platform,
	pub service: String,
	pub file: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisableReport {
	pub platform: Platform,
	/// False when there was no descriptor to remove.
	pub removed: bool,
}

/// Installs, removes and queries the autostart descriptor.
pub struct AutostartController<R = SystemRunner> {
	runner: R,
	platform: Platform,
	home: PathBuf,
	verbose: bool,
}

impl AutostartController {
	pub fn new(home: impl Into<PathBuf>) -> Self {
		Self::with_runner(SystemRunner, Platform::current(), home)
	}
}

impl<R: CommandRunner> AutostartController<R> {
	pub fn with_runner(runner: R, platform: Platform, home: impl Into<PathBuf>) -> Self {
		Self {
			runner,
			platform,
			home: home.into(),
			verbose: false,
		}
	}

	/// Stream service-manager output instead of capturing it.
	pub fn verbose(mut self, verbose: bool) -> Self {
		self.verbose = verbose;
		self
	}

	pub fn runner(&self) -> &R {
		&self.runner
	}

	pub fn enable(&self, spec: &ServiceSpec) -> Result<EnableReport, AutostartError> {
		let format = self.format_for("enable")?;
		let text = descriptor::build(spec, format)?;

		let dir = format.service_dir(&self.home);
		fs::create_dir_all(&dir).map_err(|source| AutostartError::CreateDir {
			path: dir.clone(),
			source,
		})?;
		let path = dir.join(format.file_name(&spec.name));
		fs::write(&path, text).map_err(|source| AutostartError::WriteDescriptor {
			path: path.clone(),
			source,
		})?;
		tracing::debug!("wrote {}", path.display());

		match format {
			DescriptorFormat::Plist => self.load_agent(&path)?,
			DescriptorFormat::SystemdUser => self.enable_unit(&spec.name)?,
		}

		Ok(EnableReport {
			platform: self.platform,
			service: spec.name.clone(),
			file: path,
		})
	}

	fn load_agent(&self, plist: &Path) -> Result<(), AutostartError> {
		let first = match self.launchctl("load", plist, self.mode()) {
			Ok(()) => return Ok(()),
			Err(failure) => failure,
		};
		tracing::debug!("{}; unloading and retrying", first);
		if let Err(e) = self.launchctl("unload", plist, OutputMode::Capture) {
			tracing::debug!("ignoring unload failure: {}", e);
		}
		self.launchctl("load", plist, self.mode())
			.map_err(|_| AutostartError::Enable(first))
	}

	fn enable_unit(&self, name: &str) -> Result<(), AutostartError> {
		self.systemctl(&["daemon-reload"], self.mode())
			.map_err(AutostartError::Enable)?;
		self.systemctl(&["enable", &unit_name(name)], self.mode())
			.map_err(AutostartError::Enable)?;

		let linger = CommandSpec::new("loginctl").arg("enable-linger");
		if let Err(e) = exec::run_checked(&self.runner, &linger, OutputMode::Capture) {
			tracing::warn!("could not enable linger, the service will start at login instead: {}", e);
		}
		Ok(())
	}

	/// Succeeds without doing anything when no descriptor exists.
	pub fn disable(&self, name: &str) -> Result<DisableReport, AutostartError> {
		let format = self.format_for("disable")?;
		let path = format.path(&self.home, name);
		if !path.exists() {
			return Ok(DisableReport {
				platform: self.platform,
				removed: false,
			});
		}

		match format {
			DescriptorFormat::Plist => {
				if let Err(e) = self.launchctl("unload", &path, self.mode()) {
					tracing::debug!("ignoring unload failure: {}", e);
				}
			}
			DescriptorFormat::SystemdUser => {
				let unit = unit_name(name);
				if let Err(e) = self.systemctl(&["disable", &unit], self.mode()) {
					tracing::debug!("ignoring disable failure: {}", e);
				}
				if let Err(e) = self.systemctl(&["stop", &unit], OutputMode::Capture) {
					tracing::debug!("ignoring stop failure: {}", e);
				}
			}
		}

		remove_descriptor(&path)?;

		if format == DescriptorFormat::SystemdUser {
			if let Err(e) = self.systemctl(&["daemon-reload"], OutputMode::Capture) {
				tracing::warn!("daemon-reload after removing {} failed: {}", path.display(), e);
			}
		}

		Ok(DisableReport {
			platform: self.platform,
			removed: true,
		})
	}

	/// Query failures degrade to `false`; only an unknown platform errors.
	pub fn status(&self, name: &str) -> Result<AutostartStatus, AutostartError> {
		let mut status = AutostartStatus {
			enabled: false,
			platform: self.platform,
			service: name.to_string(),
			active: None,
			kind: None,
			file: None,
			installed: false,
		};

		match self.platform {
			Platform::Unknown => return Err(self.unsupported("status")),
			Platform::Windows => {}
			Platform::MacOs => {
				status.installed = DescriptorFormat::Plist.path(&self.home, name).exists();
				status.enabled = status.installed;
			}
			Platform::Linux => {
				let path = DescriptorFormat::SystemdUser.path(&self.home, name);
				let unit = unit_name(name);
				status.installed = path.exists();
				status.enabled = status.installed && self.query("is-enabled", &unit, "enabled");
				status.active = Some(status.installed && self.query("is-active", &unit, "active"));
				status.kind = Some(SYSTEMD_SERVICE_TYPE);
				status.file = Some(path);
			}
		}
		Ok(status)
	}

	fn query(&self, verb: &str, unit: &str, expected: &str) -> bool {
		let spec = CommandSpec::new("systemctl").args(["--user", verb, unit]);
		match self.runner.run(&spec, OutputMode::Capture) {
			Ok(output) => output.success && output.stdout.trim() == expected,
			Err(e) => {
				tracing::debug!("{} failed: {}", spec, e);
				false
			}
		}
	}

	fn format_for(&self, operation: &str) -> Result<DescriptorFormat, AutostartError> {
		DescriptorFormat::for_platform(self.platform).ok_or_else(|| self.unsupported(operation))
	}

	fn unsupported(&self, operation: &str) -> AutostartError {
		let message = match self.platform {
			Platform::Windows if operation == "enable" => "Windows autostart is not yet implemented. \
				Use the Windows Task Scheduler to create a startup task manually."
				.to_string(),
			Platform::Windows => "Windows autostart is not yet implemented.".to_string(),
			_ => format!("Autostart is not supported on platform: {}", self.platform),
		};
		AutostartError::UnsupportedPlatform {
			platform: self.platform,
			message,
		}
	}

	fn mode(&self) -> OutputMode {
		OutputMode::verbose(self.verbose)
	}

	fn launchctl(&self, verb: &str, plist: &Path, mode: OutputMode) -> Result<(), CommandFailure> {
		let spec = CommandSpec::new("launchctl").args([verb.to_string(), plist.to_string_lossy().into_owned()]);
		exec::run_checked(&self.runner, &spec, mode).map(|_| ())
	}

	fn systemctl(&self, args: &[&str], mode: OutputMode) -> Result<(), CommandFailure> {
		let spec = CommandSpec::new("systemctl").arg("--user").args(args.iter().copied());
		exec::run_checked(&self.runner, &spec, mode).map(|_| ())
	}
}

fn unit_name(name: &str) -> String {
	format!("{}.service", name)
}

fn remove_descriptor(path: &Path) -> Result<(), AutostartError> {
	match fs::remove_file(path) {
		Ok(()) => Ok(()),
		Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
		Err(source) => Err(AutostartError::Disable {
			path: path.to_path_buf(),
			source,
		}),
	}
}
