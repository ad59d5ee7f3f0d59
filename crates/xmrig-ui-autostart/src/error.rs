use std::io;
use std::path::PathBuf;

use thiserror::Error;
use xmrig_ui_daemon::CommandFailure;

use crate::platform::Platform;

#[derive(Debug, Error)]
pub enum DescriptorError {
	#[error("failed to render property list: {0}")]
	Plist(#[from] plist::Error),
	#[error("property list is not valid UTF-8")]
	Utf8(#[from] std::string::FromUtf8Error),
}

#[derive(Debug, Error)]
pub enum AutostartError {
	#[error("{message}")]
	UnsupportedPlatform { platform: Platform, message: String },
	#[error("failed to enable autostart: {0}")]
	Enable(CommandFailure),
	#[error("failed to remove {path:?}: {source}")]
	Disable {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error(transparent)]
	Descriptor(#[from] DescriptorError),
	#[error("failed to create {path:?}: {source}")]
	CreateDir {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
	#[error("failed to write {path:?}: {source}")]
	WriteDescriptor {
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}
