use nix::errno::Errno;
use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;

/// The two tiers of the stop escalation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopSignal {
	/// SIGTERM
	Terminate,
	/// SIGKILL
	Kill,
}

impl StopSignal {
	fn as_nix(self) -> Signal {
		match self {
			StopSignal::Terminate => Signal::SIGTERM,
			StopSignal::Kill => Signal::SIGKILL,
		}
	}
}

impl std::fmt::Display for StopSignal {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(self.as_nix().as_str())
	}
}

/// Liveness checks and signal delivery for a tracked process.
///
/// Delivery is asynchronous with process death: after [`kill`](Self::kill)
/// callers poll [`is_running`](Self::is_running) to observe the effect.
pub trait ProcessProbe {
	/// True when `pid` exists. Never fails.
	fn is_running(&self, pid: u32) -> bool;

	/// Delivers `signal` to `pid`, returning whether delivery succeeded.
	fn kill(&self, pid: u32, signal: StopSignal) -> bool;
}

/// Probe backed by `kill(2)`.
///
/// A process owned by another user answers the zero signal with `EPERM`; it
/// is reported as alive.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalProbe;

impl ProcessProbe for SignalProbe {
	fn is_running(&self, pid: u32) -> bool {
		let Some(pid) = to_pid(pid) else {
			return false;
		};
		match kill(pid, None) {
			Ok(()) => true,
			Err(Errno::EPERM) => true,
			Err(_) => false,
		}
	}

	fn kill(&self, pid: u32, signal: StopSignal) -> bool {
		let Some(target) = to_pid(pid) else {
			return false;
		};
		match kill(target, signal.as_nix()) {
			Ok(()) => true,
			Err(e) => {
				tracing::debug!("failed to send {} to {}: {}", signal, pid, e);
				false
			}
		}
	}
}

// pid 0 and negative values address process groups in kill(2).
fn to_pid(pid: u32) -> Option<Pid> {
	match i32::try_from(pid) {
		Ok(raw) if raw > 0 => Some(Pid::from_raw(raw)),
		_ => None,
	}
}
