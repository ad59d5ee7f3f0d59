//! Renders a [`ServiceSpec`] into the file a service manager reads.
//!
//! Rendering is pure: the same spec always yields byte-identical text, so
//! enabling twice rewrites the same file.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use plist::{Dictionary, Value};

use crate::error::DescriptorError;
use crate::platform::Platform;
use crate::spec::ServiceSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DescriptorFormat {
	/// launchd agent property list.
	Plist,
	/// systemd user unit.
	SystemdUser,
}

impl DescriptorFormat {
	pub fn for_platform(platform: Platform) -> Option<Self> {
		match platform {
			Platform::MacOs => Some(DescriptorFormat::Plist),
			Platform::Linux => Some(DescriptorFormat::SystemdUser),
			Platform::Windows | Platform::Unknown => None,
		}
	}

	/// Per-user directory the service manager scans.
	pub fn service_dir(self, home: &Path) -> PathBuf {
		match self {
			DescriptorFormat::Plist => home.join("Library").join("LaunchAgents"),
			DescriptorFormat::SystemdUser => home.join(".config").join("systemd").join("user"),
		}
	}

	pub fn file_name(self, name: &str) -> String {
		match self {
			DescriptorFormat::Plist => format!("{}.plist", name),
			DescriptorFormat::SystemdUser => format!("{}.service", name),
		}
	}

	pub fn path(self, home: &Path, name: &str) -> PathBuf {
		self.service_dir(home).join(self.file_name(name))
	}
}

pub fn build(spec: &ServiceSpec, format: DescriptorFormat) -> Result<String, DescriptorError> {
	match format {
		DescriptorFormat::Plist => build_plist(spec),
		DescriptorFormat::SystemdUser => Ok(build_unit(spec)),
	}
}

fn build_plist(spec: &ServiceSpec) -> Result<String, DescriptorError> {
	let log_file = spec.log_file.to_string_lossy().into_owned();
	let program_args = spec.program_arguments().into_iter().map(Value::String).collect();

	let mut dict = Dictionary::new();
	dict.insert("Label".to_string(), Value::String(spec.name.clone()));
	dict.insert("ProgramArguments".to_string(), Value::Array(program_args));
	dict.insert(
		"WorkingDirectory".to_string(),
		Value::String(spec.working_dir.to_string_lossy().into_owned()),
	);
	dict.insert("RunAtLoad".to_string(), Value::Boolean(true));
	dict.insert("KeepAlive".to_string(), Value::Boolean(true));
	dict.insert("StartInterval".to_string(), Value::Integer(spec.delay.into()));
	dict.insert("StandardOutPath".to_string(), Value::String(log_file.clone()));
	dict.insert("StandardErrorPath".to_string(), Value::String(log_file));

	let mut buf = Vec::new();
	Value::Dictionary(dict).to_writer_xml(&mut buf)?;
	buf.push(b'\n');
	Ok(String::from_utf8(buf)?)
}

fn build_unit(spec: &ServiceSpec) -> String {
	let mut unit = String::new();
	// Writing into a String cannot fail.
	let _ = writeln!(unit, "[Unit]");
	let _ = writeln!(unit, "Description={}", spec.description);
	let _ = writeln!(unit, "After=network.target");
	let _ = writeln!(unit);
	let _ = writeln!(unit, "[Service]");
	let _ = writeln!(unit, "Type=simple");
	let _ = writeln!(unit, "User={}", spec.user);
	let _ = writeln!(unit, "WorkingDirectory={}", spec.working_dir.display());
	let _ = writeln!(unit, "ExecStart={}", spec.exec_start());
	let _ = writeln!(unit, "Restart=always");
	let _ = writeln!(unit, "RestartSec={}", spec.delay);
	let _ = writeln!(unit, "StandardOutput=journal");
	let _ = writeln!(unit, "StandardError=journal");
	let _ = writeln!(unit);
	let _ = writeln!(unit, "[Install]");
	let _ = writeln!(unit, "WantedBy=default.target");
	unit
}
