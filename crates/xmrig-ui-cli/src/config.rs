use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use xmrig_ui_daemon::paths;
use xmrig_ui_daemon::{CommandSpec, Endpoint, PreviewPlan};

pub const CONFIG_DIR_NAME: &str = "xmrig-ui";

// ── ~/.config/xmrig-ui/config.toml ──────────────────────────────────────────

#[derive(Debug, Clone, Deserialize, Default, PartialEq)]
pub struct Config {
	#[serde(default)]
	pub preview: PreviewConfig,
	#[serde(default)]
	pub autostart: AutostartConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct PreviewConfig {
	#[serde(default = "default_port")]
	pub port: u16,
	#[serde(default = "default_host")]
	pub host: String,
	/// Defaults to the current directory.
	pub project_dir: Option<PathBuf>,
	/// Relative paths resolve against `project_dir`.
	#[serde(default = "default_dist_dir")]
	pub dist_dir: PathBuf,
	#[serde(default = "default_build_command")]
	pub build_command: Vec<String>,
	#[serde(default = "default_preview_command")]
	pub preview_command: Vec<String>,
}

impl Default for PreviewConfig {
	fn default() -> Self {
		Self {
			port: default_port(),
			host: default_host(),
			project_dir: None,
			dist_dir: default_dist_dir(),
			build_command: default_build_command(),
			preview_command: default_preview_command(),
		}
	}
}

fn default_port() -> u16 { 4173 }
fn default_host() -> String { "0.0.0.0".into() }
fn default_dist_dir() -> PathBuf { PathBuf::from("dist") }
fn default_build_command() -> Vec<String> { argv(&["npm", "run", "build"]) }
fn default_preview_command() -> Vec<String> { argv(&["npm", "run", "preview", "--"]) }

fn argv(parts: &[&str]) -> Vec<String> {
	parts.iter().map(|s| s.to_string()).collect()
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct AutostartConfig {
	#[serde(default = "default_name")]
	pub name: String,
	#[serde(default = "default_display_name")]
	pub display_name: String,
	#[serde(default = "default_description")]
	pub description: String,
	/// Seconds.
	#[serde(default = "default_delay")]
	pub delay: u32,
}

impl Default for AutostartConfig {
	fn default() -> Self {
		Self {
			name: default_name(),
			display_name: default_display_name(),
			description: default_description(),
			delay: default_delay(),
		}
	}
}

fn default_name() -> String { "xmrig-web-ui".into() }
fn default_display_name() -> String { "XMRig Web UI".into() }
fn default_description() -> String { "XMRig Web UI monitoring dashboard".into() }
fn default_delay() -> u32 { 10 }

#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("`preview.{key}` must name a program")]
	EmptyCommand { key: &'static str },
	#[error("cannot determine current directory: {0}")]
	CurrentDir(#[source] io::Error),
}

impl PreviewConfig {
	pub fn project_dir(&self) -> Result<PathBuf, ConfigError> {
		match &self.project_dir {
			Some(dir) => Ok(dir.clone()),
			None => std::env::current_dir().map_err(ConfigError::CurrentDir),
		}
	}

	/// Configured endpoint with command-line overrides applied.
	pub fn endpoint(&self, port: Option<u16>, host: Option<&str>) -> Endpoint {
		Endpoint::new(host.unwrap_or(&self.host), port.unwrap_or(self.port))
	}

	pub fn plan(&self) -> Result<PreviewPlan, ConfigError> {
		let project_dir = self.project_dir()?;
		let build = CommandSpec::from_argv(&self.build_command)
			.ok_or(ConfigError::EmptyCommand { key: "build_command" })?;
		let preview = CommandSpec::from_argv(&self.preview_command)
			.ok_or(ConfigError::EmptyCommand { key: "preview_command" })?;
		Ok(PreviewPlan {
			dist_dir: project_dir.join(&self.dist_dir),
			project_dir,
			build,
			preview,
		})
	}
}

pub fn config_path() -> PathBuf {
	paths::config_dir(CONFIG_DIR_NAME).join("config.toml")
}

pub fn load_config() -> Config {
	load_from(&config_path())
}

/// Missing, unreadable or malformed files all yield defaults.
pub fn load_from(path: &Path) -> Config {
	if path.exists() {
		match std::fs::read_to_string(path) {
			Ok(content) => match toml::from_str(&content) {
				Ok(config) => return config,
				Err(e) => tracing::warn!("failed to parse {}: {}", path.display(), e),
			},
			Err(e) => tracing::warn!("failed to read {}: {}", path.display(), e),
		}
	}
	Config::default()
}
