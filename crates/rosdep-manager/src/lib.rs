//! rosdep-manager: system dependency resolution for rosfarm.
//!
//! This crate is the pipeline's environment layer. It interfaces with the
//! distro's dependency-resolution tool (rosdep) to map ROS dependency names
//! to system packages, and drives the package manager to install whatever
//! the resolved build-dependency set still needs.
//!
//! Focus: a correct name-to-package mapping and fail-fast installation.

pub mod install;
pub mod resolver;

pub use install::install_build_dependencies;
pub use resolver::{RosdepResolver, ROSDEP_RETRY_BACKOFF};
