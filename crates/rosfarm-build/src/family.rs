//! Build-system family classification.

use std::fmt;

/// The two incompatible ROS packaging families.
///
/// Determined once from the first source scan and fixed for the rest of the
/// run. Every family-dependent branch in the pipeline matches exhaustively
/// on this enum, so a new family cannot be added without every arm being
/// revisited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildFamily {
    /// catkin packages: per-package manifests with build/test dependency
    /// distinctions, built out of tree with cmake/make.
    Wet,

    /// legacy rosbuild stacks: stack-level dependency declarations, built in
    /// place with rosmake.
    Dry,
}

impl fmt::Display for BuildFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildFamily::Wet => write!(f, "wet"),
            BuildFamily::Dry => write!(f, "dry"),
        }
    }
}
