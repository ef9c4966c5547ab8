//! Service installation
//!
//! ## Module Organization
//!
//! - `orchestration` - Install state machine tying resolution, download and extraction together
//! - `package` - Temp-file guard owned by one install attempt
//! - `progress` - Lifecycle events and observers
//! - `server` - Reuse an installed server, installing it on first use

pub mod orchestration;
pub mod package;
pub mod progress;
pub mod server;

pub use orchestration::{InstallOrchestrator, InstallOutcome, InstallState};
pub use package::Package;
pub use progress::{EventSink, InstallEvent, InstallObserver, LogObserver};
pub use server::{ServerProvider, find_server_path};
