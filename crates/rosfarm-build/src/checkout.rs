//! Source checkout via rosinstall manifests.
//!
//! Both the initial target checkout and override installation funnel through
//! the same path: write the generated manifest into the workspace, then let
//! the checkout tool materialize it into the source root on top of the
//! installed distro.

use rosfarm_core::context::BuildContext;
use rosfarm_core::error::Result;
use rosfarm_core::process::{CommandLine, ProcessRunner};
use tracing::{debug, info};

/// Write `manifest` to the workspace and check its entries out into the
/// source root.
pub fn install_sources(
    ctx: &BuildContext,
    runner: &dyn ProcessRunner,
    manifest: &str,
) -> Result<()> {
    let manifest_file = ctx.rosinstall_file();
    debug!(manifest = %manifest.trim_end(), "writing rosinstall manifest");
    std::fs::write(&manifest_file, manifest)?;

    std::fs::create_dir_all(ctx.source_root())?;

    info!("installing sources from {}", manifest_file.display());
    let command = CommandLine::new("rosinstall")
        .arg(format!("-j{}", ctx.jobs))
        .arg("--verbose")
        .arg("--continue-on-error")
        .arg(ctx.source_root().display().to_string())
        .arg(manifest_file.display().to_string())
        .arg(ctx.ros_root().display().to_string());
    runner.run(&command)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosfarm_core::process::fakes::ScriptedRunner;
    use tempfile::tempdir;

    fn scratch_context() -> (tempfile::TempDir, BuildContext) {
        let dir = tempdir().unwrap();
        let workspace = dir.path().join("workspace");
        std::fs::create_dir_all(&workspace).unwrap();
        let ctx = BuildContext::new(&workspace, "groovy", "").with_temp_root(dir.path().join("tmp"));
        (dir, ctx)
    }

    #[test]
    fn writes_the_manifest_into_the_workspace() {
        let (_dir, ctx) = scratch_context();
        let runner = ScriptedRunner::new();
        let entry = "- git: {local-name: foo, uri: 'git://example/foo', version: master}\n";

        install_sources(&ctx, &runner, entry).unwrap();

        let written = std::fs::read_to_string(ctx.rosinstall_file()).unwrap();
        assert_eq!(written, entry);
        assert!(ctx.source_root().is_dir());
    }

    #[test]
    fn invokes_the_checkout_tool_with_the_jobs_hint() {
        let (_dir, ctx) = scratch_context();
        let runner = ScriptedRunner::new();

        install_sources(&ctx, &runner, "- git: {local-name: foo, uri: 'u'}\n").unwrap();

        let calls = runner.command_lines();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("rosinstall -j8 --verbose --continue-on-error"));
        assert!(calls[0].contains("src_repository"));
        assert!(calls[0].ends_with("/opt/ros/groovy"));
    }

    #[test]
    fn rewrites_the_manifest_on_every_install() {
        let (_dir, ctx) = scratch_context();
        let runner = ScriptedRunner::new();

        install_sources(&ctx, &runner, "first\n").unwrap();
        install_sources(&ctx, &runner, "second\n").unwrap();

        let written = std::fs::read_to_string(ctx.rosinstall_file()).unwrap();
        assert_eq!(written, "second\n");
    }
}
