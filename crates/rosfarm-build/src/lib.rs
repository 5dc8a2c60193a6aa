//! rosfarm-build: the build side of the rosfarm CI pipeline.
//!
//! Provides the sequential pipeline that:
//! - checks the triggering repository out from source,
//! - classifies the source tree into the two ROS packaging families,
//! - resolves and installs build dependencies (source overrides first,
//!   system packages second),
//! - partitions the workspace into wet and dry build roots, and
//! - drives the family-appropriate native build tool.

pub mod checkout;
pub mod driver;
pub mod family;
pub mod manifest;
pub mod overrides;
pub mod partition;
pub mod pipeline;
pub mod resolve;
pub mod scan;

pub use family::BuildFamily;
pub use overrides::OverrideOutcome;
pub use pipeline::{run, BuildReport};
pub use resolve::{resolve_dependencies, resolve_mixed_dependencies};
pub use scan::{DryPackage, DryStack, PackageIndex, WetPackage};
