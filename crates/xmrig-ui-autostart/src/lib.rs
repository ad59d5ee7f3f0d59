//! Boot-time autostart for the XMRig Web UI.
//!
//! A [`ServiceSpec`] is rendered into a launchd agent (macOS) or a systemd
//! user unit (Linux) by [`descriptor::build`], and [`AutostartController`]
//! installs, removes and queries it through the platform's service manager.

pub mod controller;
pub mod descriptor;
pub mod error;
pub mod platform;
pub mod spec;

pub use controller::{AutostartController, AutostartState, AutostartStatus, DisableReport, EnableReport};
pub use descriptor::DescriptorFormat;
pub use error::{AutostartError, DescriptorError};
pub use platform::Platform;
pub use spec::ServiceSpec;
