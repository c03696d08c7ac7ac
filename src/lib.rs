pub mod agent;
pub mod app;
pub mod capture;
pub mod config;
pub mod delivery;
pub mod domain;
pub mod infrastructure;
pub mod intake;
pub mod remote_log;

pub use agent::{CaptureAgent, CaptureOutcome};
pub use remote_log::{LogLevel, RemoteLogger};
