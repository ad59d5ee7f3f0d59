use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::PathBuf;

use tempfile::TempDir;

use xmrig_ui_autostart::{
	AutostartController, AutostartError, AutostartState, DescriptorFormat, Platform, ServiceSpec,
};
use xmrig_ui_daemon::{ChildHandle, CommandOutput, CommandRunner, CommandSpec, OutputMode};

// --- Fake service manager ---

#[derive(Default)]
struct FakeRunner {
	calls: RefCell<Vec<String>>,
	/// Command lines that fail until they have failed this many times.
	failures: RefCell<HashMap<String, u32>>,
	stdout: HashMap<String, String>,
}

impl FakeRunner {
	fn failing(mut self, command: &str, times: u32) -> Self {
		self.failures.get_mut().insert(command.to_string(), times);
		self
	}

	fn answering(mut self, command: &str, stdout: &str) -> Self {
		self.stdout.insert(command.to_string(), stdout.to_string());
		self
	}

	fn calls(&self) -> Vec<String> {
		self.calls.borrow().clone()
	}
}

impl CommandRunner for FakeRunner {
	fn run(&self, spec: &CommandSpec, _mode: OutputMode) -> io::Result<CommandOutput> {
		let line = spec.to_string();
		self.calls.borrow_mut().push(line.clone());

		let mut failures = self.failures.borrow_mut();
		if let Some(left) = failures.get_mut(&line) {
			if *left > 0 {
				*left -= 1;
				return Ok(CommandOutput {
					code: Some(1),
					success: false,
					stdout: String::new(),
					stderr: format!("{} failed\n", spec.program),
				});
			}
		}
		Ok(CommandOutput {
			code: Some(0),
			success: true,
			stdout: self.stdout.get(&line).cloned().unwrap_or_default(),
			stderr: String::new(),
		})
	}

	fn spawn_detached(&self, _spec: &CommandSpec) -> io::Result<Box<dyn ChildHandle>> {
		Err(io::Error::new(io::ErrorKind::Unsupported, "not used"))
	}

	fn spawn_attached(&self, _spec: &CommandSpec) -> io::Result<Box<dyn ChildHandle>> {
		Err(io::Error::new(io::ErrorKind::Unsupported, "not used"))
	}
}

fn spec() -> ServiceSpec {
	ServiceSpec {
		name: "xmrig-web-ui".into(),
		display_name: "XMRig Web UI".into(),
		description: "XMRig Web UI monitoring dashboard".into(),
		exec_path: PathBuf::from("/usr/local/bin/xmrig-ui"),
		args: vec!["start", "--daemon", "--port", "4173", "--host", "0.0.0.0"]
			.into_iter()
			.map(String::from)
			.collect(),
		working_dir: PathBuf::from("/opt/xmrig-ui"),
		user: "miner".into(),
		delay: 10,
		log_file: PathBuf::from("/tmp/xmrig-web-ui.log"),
	}
}

fn controller(platform: Platform, runner: FakeRunner) -> (TempDir, AutostartController<FakeRunner>) {
	let home = TempDir::new().unwrap();
	let controller = AutostartController::with_runner(runner, platform, home.path());
	(home, controller)
}

const UNIT: &str = "xmrig-web-ui.service";

// --- Linux ---

#[test]
fn linux_enable_writes_unit_and_registers_it() {
	let (home, c) = controller(Platform::Linux, FakeRunner::default());
	let report = c.enable(&spec()).unwrap();

	let path = home.path().join(".config/systemd/user/xmrig-web-ui.service");
	assert_eq!(report.file, path);
	assert_eq!(report.service, "xmrig-web-ui");
	assert!(fs::read_to_string(&path).unwrap().contains("RestartSec=10"));
	assert_eq!(
		c.runner().calls(),
		vec![
			"systemctl --user daemon-reload".to_string(),
			format!("systemctl --user enable {}", UNIT),
			"loginctl enable-linger".to_string(),
		]
	);
}

#[test]
fn linux_enable_twice_is_idempotent() {
	let (home, c) = controller(Platform::Linux, FakeRunner::default());
	let path = home.path().join(".config/systemd/user/xmrig-web-ui.service");

	c.enable(&spec()).unwrap();
	let first = fs::read(&path).unwrap();
	c.enable(&spec()).unwrap();
	let second = fs::read(&path).unwrap();

	assert_eq!(first, second);
	let text = String::from_utf8(second).unwrap();
	assert_eq!(text.matches("WantedBy=").count(), 1);
}

#[test]
fn linger_failure_is_swallowed() {
	let runner = FakeRunner::default().failing("loginctl enable-linger", 1);
	let (_home, c) = controller(Platform::Linux, runner);
	assert!(c.enable(&spec()).is_ok());
}

#[test]
fn linux_enable_failure_carries_command_output() {
	let runner = FakeRunner::default().failing(&format!("systemctl --user enable {}", UNIT), 1);
	let (_home, c) = controller(Platform::Linux, runner);

	match c.enable(&spec()).unwrap_err() {
		AutostartError::Enable(failure) => {
			assert_eq!(failure.command, format!("systemctl --user enable {}", UNIT));
			assert_eq!(failure.message, "systemctl failed");
		}
		other => panic!("unexpected error: {other}"),
	}
	assert!(!c.runner().calls().contains(&"loginctl enable-linger".to_string()));
}

#[test]
fn enable_then_disable_returns_to_absent() {
	let runner = FakeRunner::default()
		.answering(&format!("systemctl --user is-enabled {}", UNIT), "enabled\n")
		.answering(&format!("systemctl --user is-active {}", UNIT), "active\n");
	let (home, c) = controller(Platform::Linux, runner);

	c.enable(&spec()).unwrap();
	assert_eq!(c.status("xmrig-web-ui").unwrap().state(), AutostartState::InstalledActive);

	let report = c.disable("xmrig-web-ui").unwrap();
	assert!(report.removed);
	assert!(!home.path().join(".config/systemd/user/xmrig-web-ui.service").exists());
	assert_eq!(c.status("xmrig-web-ui").unwrap().state(), AutostartState::Absent);
}

#[test]
fn linux_disable_sequence_is_best_effort() {
	let runner = FakeRunner::default()
		.failing(&format!("systemctl --user disable {}", UNIT), 1)
		.failing(&format!("systemctl --user stop {}", UNIT), 1)
		.failing("systemctl --user daemon-reload", 1);
	let (home, c) = controller(Platform::Linux, runner);
	let path = DescriptorFormat::SystemdUser.path(home.path(), "xmrig-web-ui");
	fs::create_dir_all(path.parent().unwrap()).unwrap();
	fs::write(&path, "[Unit]\n").unwrap();

	let report = c.disable("xmrig-web-ui").unwrap();
	assert!(report.removed);
	assert!(!path.exists());
	assert_eq!(
		c.runner().calls(),
		vec![
			format!("systemctl --user disable {}", UNIT),
			format!("systemctl --user stop {}", UNIT),
			"systemctl --user daemon-reload".to_string(),
		]
	);
}

#[test]
fn disable_without_descriptor_is_a_no_op() {
	let (_home, c) = controller(Platform::Linux, FakeRunner::default());
	let report = c.disable("xmrig-web-ui").unwrap();
	assert!(!report.removed);
	assert!(c.runner().calls().is_empty());
}

#[test]
fn linux_status_reports_enabled_and_active_independently() {
	let runner = FakeRunner::default()
		.answering(&format!("systemctl --user is-enabled {}", UNIT), "enabled\n")
		.failing(&format!("systemctl --user is-active {}", UNIT), 1);
	let (_home, c) = controller(Platform::Linux, runner);
	c.enable(&spec()).unwrap();

	let status = c.status("xmrig-web-ui").unwrap();
	assert!(status.enabled);
	assert_eq!(status.active, Some(false));
	assert_eq!(status.state(), AutostartState::InstalledInactive);

	let json = serde_json::to_value(&status).unwrap();
	assert_eq!(json["type"], "systemd user service");
	assert_eq!(json["active"], false);
	assert!(json["file"].as_str().unwrap().ends_with("xmrig-web-ui.service"));
}

#[test]
fn running_unit_that_is_not_enabled_is_installed_active() {
	let runner = FakeRunner::default()
		.answering(&format!("systemctl --user is-enabled {}", UNIT), "disabled\n")
		.answering(&format!("systemctl --user is-active {}", UNIT), "active\n");
	let (_home, c) = controller(Platform::Linux, runner);
	c.enable(&spec()).unwrap();

	let status = c.status("xmrig-web-ui").unwrap();
	assert!(!status.enabled);
	assert_eq!(status.active, Some(true));
	assert_eq!(status.state(), AutostartState::InstalledActive);
}

#[test]
fn installed_but_disabled_and_stopped_unit_is_installed_inactive() {
	let runner = FakeRunner::default()
		.answering(&format!("systemctl --user is-enabled {}", UNIT), "disabled\n")
		.answering(&format!("systemctl --user is-active {}", UNIT), "inactive\n");
	let (_home, c) = controller(Platform::Linux, runner);
	c.enable(&spec()).unwrap();

	assert_eq!(c.status("xmrig-web-ui").unwrap().state(), AutostartState::InstalledInactive);
}

#[test]
fn linux_status_without_unit_skips_queries() {
	let (_home, c) = controller(Platform::Linux, FakeRunner::default());
	let status = c.status("xmrig-web-ui").unwrap();
	assert!(!status.enabled);
	assert_eq!(status.active, Some(false));
	assert_eq!(status.state(), AutostartState::Absent);
	assert!(c.runner().calls().is_empty());
}

// --- macOS ---

#[test]
fn macos_enable_loads_agent() {
	let (home, c) = controller(Platform::MacOs, FakeRunner::default());
	let report = c.enable(&spec()).unwrap();

	let path = home.path().join("Library/LaunchAgents/xmrig-web-ui.plist");
	assert_eq!(report.file, path);
	let value = plist::Value::from_file(&path).unwrap();
	let dict = value.as_dictionary().unwrap();
	assert_eq!(dict.get("Label").and_then(plist::Value::as_string), Some("xmrig-web-ui"));
	assert_eq!(c.runner().calls(), vec![format!("launchctl load {}", path.display())]);
}

#[test]
fn macos_enable_unloads_and_retries_once() {
	let home = TempDir::new().unwrap();
	let path = home.path().join("Library/LaunchAgents/xmrig-web-ui.plist");
	let load = format!("launchctl load {}", path.display());
	let unload = format!("launchctl unload {}", path.display());
	let runner = FakeRunner::default().failing(&load, 1);
	let c = AutostartController::with_runner(runner, Platform::MacOs, home.path());

	c.enable(&spec()).unwrap();
	assert_eq!(c.runner().calls(), vec![load.clone(), unload, load]);
}

#[test]
fn macos_enable_gives_up_after_second_load() {
	let home = TempDir::new().unwrap();
	let path = home.path().join("Library/LaunchAgents/xmrig-web-ui.plist");
	let load = format!("launchctl load {}", path.display());
	let runner = FakeRunner::default().failing(&load, 2);
	let c = AutostartController::with_runner(runner, Platform::MacOs, home.path());

	let err = c.enable(&spec()).unwrap_err();
	assert!(matches!(err, AutostartError::Enable(_)));
	assert_eq!(c.runner().calls().len(), 3);
}

#[test]
fn macos_status_follows_descriptor_file() {
	let (_home, c) = controller(Platform::MacOs, FakeRunner::default());
	assert_eq!(c.status("xmrig-web-ui").unwrap().state(), AutostartState::Absent);

	c.enable(&spec()).unwrap();
	let status = c.status("xmrig-web-ui").unwrap();
	assert!(status.enabled);
	assert_eq!(status.active, None);
	assert_eq!(status.state(), AutostartState::InstalledInactive);

	c.disable("xmrig-web-ui").unwrap();
	assert!(!c.status("xmrig-web-ui").unwrap().enabled);
}

// --- Unsupported platforms ---

#[test]
fn windows_enable_is_not_implemented() {
	let (home, c) = controller(Platform::Windows, FakeRunner::default());
	match c.enable(&spec()).unwrap_err() {
		AutostartError::UnsupportedPlatform { platform, message } => {
			assert_eq!(platform, Platform::Windows);
			assert!(message.contains("not yet implemented"));
		}
		other => panic!("unexpected error: {other}"),
	}
	assert!(fs::read_dir(home.path()).unwrap().next().is_none());
	assert!(matches!(
		c.disable("xmrig-web-ui"),
		Err(AutostartError::UnsupportedPlatform { .. })
	));
}

#[test]
fn windows_status_reports_disabled() {
	let (_home, c) = controller(Platform::Windows, FakeRunner::default());
	let status = c.status("xmrig-web-ui").unwrap();
	assert!(!status.enabled);
	assert_eq!(status.platform, Platform::Windows);
}

#[test]
fn unknown_platform_fails_every_operation() {
	let (_home, c) = controller(Platform::Unknown, FakeRunner::default());
	assert!(matches!(c.enable(&spec()), Err(AutostartError::UnsupportedPlatform { .. })));
	assert!(matches!(c.disable("x"), Err(AutostartError::UnsupportedPlatform { .. })));
	assert!(matches!(c.status("x"), Err(AutostartError::UnsupportedPlatform { .. })));
	assert!(c.runner().calls().is_empty());
}

#[test]
fn unsupported_message_names_the_controller_platform() {
	let (_home, c) = controller(Platform::Unknown, FakeRunner::default());
	match c.status("x").unwrap_err() {
		AutostartError::UnsupportedPlatform { platform, message } => {
			assert_eq!(platform, Platform::Unknown);
			assert_eq!(message, "Autostart is not supported on platform: unknown");
		}
		other => panic!("unexpected error: {other}"),
	}
}
