use std::path::PathBuf;

/// Well-known locations of the daemon's runtime artefacts.
///
/// The PID file and the log file share one directory (the OS temp dir by
/// default) and are named after the application.
#[derive(Debug, Clone)]
pub struct RuntimePaths {
	pub app_name: String,
	dir: PathBuf,
}

impl RuntimePaths {
	pub fn new(app_name: impl Into<String>) -> Self {
		Self::in_dir(std::env::temp_dir(), app_name)
	}

	pub fn in_dir(dir: impl Into<PathBuf>, app_name: impl Into<String>) -> Self {
		Self {
			app_name: app_name.into(),
			dir: dir.into(),
		}
	}

	pub fn pid_path(&self) -> PathBuf {
		self.dir.join(format!("{}.pid", self.app_name))
	}

	pub fn log_path(&self) -> PathBuf {
		self.dir.join(format!("{}.log", self.app_name))
	}
}

/// Per-user configuration directory for `app_name`, honouring `XDG_CONFIG_HOME`.
pub fn config_dir(app_name: &str) -> PathBuf {
	if let Ok(dir) = std::env::var("XDG_CONFIG_HOME") {
		PathBuf::from(dir).join(app_name)
	} else if let Some(home) = home_dir() {
		home.join(".config").join(app_name)
	} else {
		std::env::temp_dir().join(app_name).join("config")
	}
}

pub fn home_dir() -> Option<PathBuf> {
	std::env::var("HOME").ok().map(PathBuf::from)
}
