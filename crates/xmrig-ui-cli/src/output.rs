use owo_colors::OwoColorize;
use serde_json::Value;

/// Presentation mode for one invocation.
///
/// JSON mode prints exactly one object on stdout and nothing else; text mode
/// prints coloured lines, trimmed to the essentials with `--quiet`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Output {
	pub json: bool,
	pub quiet: bool,
}

impl Output {
	pub fn new(json: bool, quiet: bool) -> Self {
		Self { json, quiet }
	}

	/// Prints `payload` in JSON mode, otherwise runs `human`.
	pub fn report(&self, payload: &Value, human: impl FnOnce()) {
		if self.json {
			print_json(payload);
		} else {
			human();
		}
	}

	/// Non-essential progress text.
	pub fn note(&self, message: &str) {
		if !self.json && !self.quiet {
			eprintln!("{}", message.dimmed());
		}
	}

	pub fn warn(&self, message: &str) {
		if !self.json {
			eprintln!("{} {}", "warning:".yellow(), message);
		}
	}

	pub fn fatal(&self, message: &str) {
		if self.json {
			print_json(&error_payload(message));
		} else {
			eprintln!("{} {}", "error:".red(), message);
		}
	}
}

pub fn error_payload(message: &str) -> Value {
	serde_json::json!({ "status": "error", "message": message })
}

fn print_json(value: &Value) {
	match serde_json::to_string_pretty(value) {
		Ok(text) => println!("{}", text),
		Err(_) => println!("{}", value),
	}
}

pub fn format_uptime(secs: u64) -> String {
	if secs < 60 {
		format!("{}s", secs)
	} else if secs < 3600 {
		let m = secs / 60;
		let s = secs % 60;
		if s == 0 { format!("{}m", m) } else { format!("{}m{}s", m, s) }
	} else if secs < 86400 {
		let h = secs / 3600;
		let m = (secs % 3600) / 60;
		if m == 0 { format!("{}h", h) } else { format!("{}h{}m", h, m) }
	} else {
		let d = secs / 86400;
		let h = (secs % 86400) / 3600;
		if h == 0 { format!("{}d", d) } else { format!("{}d{}h", d, h) }
	}
}

pub fn format_bytes(bytes: u64) -> String {
	const KIB: u64 = 1024;
	const MIB: u64 = KIB * 1024;
	if bytes < KIB {
		format!("{}B", bytes)
	} else if bytes < MIB {
		format!("{:.1}K", bytes as f64 / KIB as f64)
	} else {
		format!("{:.1}M", bytes as f64 / MIB as f64)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn uptime_formatting() {
		assert_eq!(format_uptime(42), "42s");
		assert_eq!(format_uptime(120), "2m");
		assert_eq!(format_uptime(3725), "1h2m");
		assert_eq!(format_uptime(90000), "1d1h");
	}

	#[test]
	fn byte_formatting() {
		assert_eq!(format_bytes(512), "512B");
		assert_eq!(format_bytes(2048), "2.0K");
		assert_eq!(format_bytes(3 * 1024 * 1024), "3.0M");
	}

	#[test]
	fn error_envelope() {
		assert_eq!(
			error_payload("boom"),
			serde_json::json!({ "status": "error", "message": "boom" })
		);
	}
}
