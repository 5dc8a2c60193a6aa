//! Core domain model for the rosfarm build pipeline.
//!
//! This crate holds everything the orchestration stages share:
//! - the pipeline configuration (repositories and their source overrides),
//! - the immutable per-run [`BuildContext`],
//! - the [`ProcessRunner`] capability wrapping external tool invocation,
//! - ROS environment capture, and
//! - the common [`PipelineError`] taxonomy.

pub mod config;
pub mod context;
pub mod error;
pub mod process;
pub mod rosenv;
pub mod telemetry;

pub use config::{BuildIdentifier, PipelineConfig, RepoEntry, SourceOverride};
pub use context::BuildContext;
pub use error::{PipelineError, Result};
pub use process::{CommandLine, ProcessRunner, SystemRunner, ToolOutput};
pub use rosenv::ros_env;
pub use telemetry::init_tracing;
