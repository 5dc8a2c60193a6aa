//! System package installation for resolved dependency names.
//!
//! Names the resolver knows are installed under their system package names;
//! names it does not know are handed to the package manager verbatim. Any
//! installation failure aborts the whole batch; a missing build dependency
//! makes the subsequent build meaningless.

use crate::resolver::RosdepResolver;
use rosfarm_core::error::Result;
use rosfarm_core::process::{CommandLine, ProcessRunner};
use tracing::{debug, info};

/// Install every name in `names`, returning the system package names that
/// were handed to the package manager.
pub fn install_build_dependencies(
    names: &[String],
    resolver: &RosdepResolver,
    runner: &dyn ProcessRunner,
) -> Result<Vec<String>> {
    if names.is_empty() {
        debug!("no system build dependencies to install");
        return Ok(Vec::new());
    }

    let mut resolved = Vec::new();
    let mut unmapped = Vec::new();
    for name in names {
        match resolver.to_apt(name) {
            Some(packages) => resolved.extend(packages.iter().cloned()),
            None => {
                debug!(%name, "no rosdep mapping, installing the name itself");
                unmapped.push(name.clone());
            }
        }
    }

    let mut installed = Vec::new();
    for batch in [resolved, unmapped] {
        if batch.is_empty() {
            continue;
        }
        info!(packages = %batch.join(" "), "installing system packages");
        apt_get_install(&batch, runner)?;
        installed.extend(batch);
    }

    Ok(installed)
}

fn apt_get_install(packages: &[String], runner: &dyn ProcessRunner) -> Result<()> {
    let command = CommandLine::new("apt-get")
        .arg("install")
        .arg("--yes")
        .args(packages.iter().cloned());
    runner.run(&command)?;
    Ok(())
}
