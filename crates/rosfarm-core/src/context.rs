//! Per-run paths and settings.
//!
//! The context is built once from the CI job's inputs and threaded through
//! every stage. Stages never change the process working directory or the
//! ambient environment; tool invocations receive explicit paths and
//! environment maps instead.

use std::path::{Path, PathBuf};

/// Fixed temporary tree the sources and build output live under.
pub const DEFAULT_TEMP_ROOT: &str = "/tmp/test_repositories";

/// Job-count hint passed to the native tools (checkout and compile).
pub const DEFAULT_JOBS: u32 = 8;

/// Immutable record of everything location- or distro-specific for one run.
#[derive(Debug, Clone)]
pub struct BuildContext {
    /// CI-provided workspace directory; receives the generated rosinstall
    /// manifest and, on dry build failure, the relocated build logs.
    pub workspace: PathBuf,

    /// Target ROS distribution release tag.
    pub ros_distro: String,

    /// Externally provided search path for legacy packages.
    pub ros_package_path: String,

    /// Parallelism hint for the invoked native tools.
    pub jobs: u32,

    temp_root: PathBuf,
}

impl BuildContext {
    pub fn new(
        workspace: impl Into<PathBuf>,
        ros_distro: impl Into<String>,
        ros_package_path: impl Into<String>,
    ) -> Self {
        Self {
            workspace: workspace.into(),
            ros_distro: ros_distro.into(),
            ros_package_path: ros_package_path.into(),
            jobs: DEFAULT_JOBS,
            temp_root: PathBuf::from(DEFAULT_TEMP_ROOT),
        }
    }

    /// Relocate the temporary tree, for tests running against a scratch dir.
    pub fn with_temp_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.temp_root = root.into();
        self
    }

    /// Location the repositories are checked out into.
    pub fn source_root(&self) -> PathBuf {
        self.temp_root.join("src_repository")
    }

    /// Build root for catkin packages after partitioning.
    pub fn wet_root(&self) -> PathBuf {
        self.source_root().join("wet")
    }

    /// Build root for rosbuild stacks after partitioning.
    pub fn dry_root(&self) -> PathBuf {
        self.source_root().join("dry")
    }

    /// Out-of-tree build space for the wet workspace.
    pub fn build_root(&self) -> PathBuf {
        self.temp_root.join("build_repository")
    }

    /// Where rosmake writes its structured build logs.
    pub fn dry_build_logs(&self) -> PathBuf {
        self.dry_root().join("build_logs")
    }

    /// Installed distro root.
    pub fn ros_root(&self) -> PathBuf {
        Path::new("/opt/ros").join(&self.ros_distro)
    }

    /// Distro environment setup file.
    pub fn ros_setup_file(&self) -> PathBuf {
        self.ros_root().join("setup.bash")
    }

    /// The generated dependency-install manifest in the workspace.
    pub fn rosinstall_file(&self) -> PathBuf {
        self.workspace.join("repo.rosinstall")
    }

    /// Where failed dry builds park their logs for the CI job to archive.
    pub fn workspace_build_logs(&self) -> PathBuf {
        self.workspace.join("build_logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths_hang_off_the_temp_root() {
        let ctx = BuildContext::new("/ws", "groovy", "/opt/ros/groovy/stacks");
        assert_eq!(
            ctx.source_root(),
            PathBuf::from("/tmp/test_repositories/src_repository")
        );
        assert_eq!(
            ctx.wet_root(),
            PathBuf::from("/tmp/test_repositories/src_repository/wet")
        );
        assert_eq!(
            ctx.build_root(),
            PathBuf::from("/tmp/test_repositories/build_repository")
        );
        assert_eq!(
            ctx.dry_build_logs(),
            PathBuf::from("/tmp/test_repositories/src_repository/dry/build_logs")
        );
    }

    #[test]
    fn workspace_paths_hang_off_the_workspace() {
        let ctx = BuildContext::new("/ws", "groovy", "");
        assert_eq!(ctx.rosinstall_file(), PathBuf::from("/ws/repo.rosinstall"));
        assert_eq!(ctx.workspace_build_logs(), PathBuf::from("/ws/build_logs"));
    }

    #[test]
    fn distro_paths_follow_the_release_tag() {
        let ctx = BuildContext::new("/ws", "groovy", "");
        assert_eq!(ctx.ros_setup_file(), PathBuf::from("/opt/ros/groovy/setup.bash"));
    }

    #[test]
    fn temp_root_override_moves_the_tree() {
        let ctx = BuildContext::new("/ws", "groovy", "").with_temp_root("/scratch");
        assert_eq!(ctx.source_root(), PathBuf::from("/scratch/src_repository"));
    }
}
