//! Native build tool drivers, one per packaging family.

use crate::scan::PackageIndex;
use rosfarm_core::context::BuildContext;
use rosfarm_core::error::Result;
use rosfarm_core::process::{CommandLine, ProcessRunner};
use rosfarm_core::rosenv::ros_env;
use tracing::{error, info, warn};

/// Configure and build the wet workspace with the catkin toolchain.
///
/// Bootstraps the build-root manifest (`catkin_init_workspace` symlinks the
/// toplevel CMakeLists), then configures and compiles out of tree.
pub fn build_wet(ctx: &BuildContext, runner: &dyn ProcessRunner) -> Result<()> {
    let env = ros_env(&ctx.ros_setup_file(), runner)?;
    let wet_root = ctx.wet_root();

    info!("initializing catkin workspace in {}", wet_root.display());
    runner.run(
        &CommandLine::new("catkin_init_workspace")
            .arg(wet_root.display().to_string())
            .env_map(env.clone()),
    )?;

    let build_root = ctx.build_root();
    std::fs::create_dir_all(&build_root)?;

    info!("configuring wet workspace");
    let configure = CommandLine::new("cmake")
        .arg(format!("{}/", wet_root.display()))
        .env_map(env.clone())
        .current_dir(&build_root);
    if let Err(e) = runner.run(&configure) {
        error!("failed to cmake the wet workspace");
        return Err(e);
    }

    info!("building wet repository list");
    let compile = CommandLine::new("make")
        .env_map(env)
        .current_dir(&build_root);
    if let Err(e) = runner.run(&compile) {
        error!("failed to make the wet packages");
        return Err(e);
    }
    Ok(())
}

/// Build the dry target with rosmake after satisfying every local stack's
/// system prerequisites.
///
/// On failure the structured rosmake logs are relocated into the workspace
/// before the error propagates, so diagnostics survive the fatal build.
pub fn build_dry(
    ctx: &BuildContext,
    runner: &dyn ProcessRunner,
    repository: &str,
    index: &PackageIndex,
) -> Result<()> {
    let source_root = ctx.source_root();
    let mut env = ros_env(&source_root.join("setup.bash"), runner)?;
    env.insert(
        "ROS_PACKAGE_PATH".to_string(),
        format!("{}:{}", source_root.display(), ctx.ros_package_path),
    );

    for stack in index.stacks.keys() {
        info!(%stack, "installing stack prerequisites");
        runner.run(
            &CommandLine::new("rosdep")
                .args(["install", "-y"])
                .arg(stack.clone())
                .env_map(env.clone()),
        )?;
    }

    info!(%repository, "building dry repository");
    let logs = ctx.dry_build_logs();
    let rosmake = CommandLine::new("rosmake")
        .args(["-rV", "--profile"])
        .arg(format!("--pjobs={}", ctx.jobs))
        .arg(format!("--output={}", logs.display()))
        .arg(repository)
        .env_map(env);
    if let Err(e) = runner.run(&rosmake) {
        relocate_build_logs(ctx);
        error!(%repository, "failed to rosmake the dry repository");
        return Err(e);
    }
    Ok(())
}

/// Best-effort move of the rosmake logs into the workspace for archival.
fn relocate_build_logs(ctx: &BuildContext) {
    let logs = ctx.dry_build_logs();
    if !logs.exists() {
        return;
    }
    let target = ctx.workspace_build_logs();
    match std::fs::rename(&logs, &target) {
        Ok(()) => info!("relocated build logs to {}", target.display()),
        Err(e) => warn!(error = %e, "could not relocate build logs"),
    }
}
