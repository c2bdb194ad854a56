//! Types and process plumbing shared by every crate in the workspace.

pub mod config;
pub mod telemetry;
pub mod types;

pub use config::{Config, LogFormat};
pub use types::AggregateId;
