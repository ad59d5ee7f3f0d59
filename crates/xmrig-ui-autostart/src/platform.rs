use std::fmt;

use serde::Serialize;

/// Host platform as far as autostart is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
	MacOs,
	Linux,
	Windows,
	Unknown,
}

impl Platform {
	pub fn current() -> Self {
		Self::from_os(std::env::consts::OS)
	}

	/// Maps a `std::env::consts::OS` value.
	pub fn from_os(os: &str) -> Self {
		match os {
			"macos" => Platform::MacOs,
			"linux" => Platform::Linux,
			"windows" => Platform::Windows,
			_ => Platform::Unknown,
		}
	}

	pub fn as_str(self) -> &'static str {
		match self {
			Platform::MacOs => "macos",
			Platform::Linux => "linux",
			Platform::Windows => "windows",
			Platform::Unknown => "unknown",
		}
	}
}

impl fmt::Display for Platform {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
