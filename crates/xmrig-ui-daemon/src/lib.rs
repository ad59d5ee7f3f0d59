//! Lifecycle of the XMRig Web UI preview server as a background daemon.
//!
//! The daemon is tracked by a PID file under the temp directory and probed
//! with `kill(pid, 0)`. [`DaemonLifecycle`] drives start, stop, restart and
//! status on top of three collaborators: a [`PidStore`], a [`ProcessProbe`]
//! and a [`CommandRunner`]. Tests swap the last two for fakes.

pub mod error;
pub mod exec;
pub mod lifecycle;
pub mod metrics;
pub mod paths;
pub mod pid;
pub mod probe;
pub mod signals;

pub use error::{LifecycleError, PidError};
pub use exec::{ChildHandle, CommandFailure, CommandOutput, CommandRunner, CommandSpec, Exit, OutputMode, SystemRunner};
pub use lifecycle::{
	DaemonLifecycle, DaemonState, Endpoint, PreviewPlan, RestartOutcome, RunMode, ServiceStatus, StartOptions,
	StartOutcome, StatusReport, StopOutcome, Timings,
};
pub use metrics::{LogFileInfo, MemorySnapshot, SystemSnapshot};
pub use paths::RuntimePaths;
pub use pid::{PidRecord, PidStore};
pub use probe::{ProcessProbe, SignalProbe, StopSignal};
pub use signals::{Interrupt, SignalSubscription};
