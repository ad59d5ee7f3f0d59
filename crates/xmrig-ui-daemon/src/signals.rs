use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::SigId;

/// Which interrupt arrived since the last poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupt {
	Interrupt,
	Terminate,
}

/// SIGINT/SIGTERM subscription owned by one foreground run.
///
/// Registration replaces the default disposition for as long as the
/// subscription lives; dropping it unregisters both handlers.
pub struct SignalSubscription {
	interrupt: Arc<AtomicBool>,
	terminate: Arc<AtomicBool>,
	ids: Vec<SigId>,
}

impl SignalSubscription {
	pub fn register() -> io::Result<Self> {
		let interrupt = Arc::new(AtomicBool::new(false));
		let terminate = Arc::new(AtomicBool::new(false));
		let mut subscription = Self {
			interrupt: Arc::clone(&interrupt),
			terminate: Arc::clone(&terminate),
			ids: Vec::with_capacity(2),
		};
		// On error `subscription` drops here and unregisters what was added.
		subscription.ids.push(signal_hook::flag::register(SIGINT, interrupt)?);
		subscription.ids.push(signal_hook::flag::register(SIGTERM, terminate)?);
		Ok(subscription)
	}

	/// Takes the pending interrupt, if any. SIGINT wins when both are pending.
	pub fn take(&self) -> Option<Interrupt> {
		let int = self.interrupt.swap(false, Ordering::SeqCst);
		let term = self.terminate.swap(false, Ordering::SeqCst);
		if int {
			Some(Interrupt::Interrupt)
		} else if term {
			Some(Interrupt::Terminate)
		} else {
			None
		}
	}
}

impl Drop for SignalSubscription {
	fn drop(&mut self) {
		for id in self.ids.drain(..) {
			signal_hook::low_level::unregister(id);
		}
	}
}
