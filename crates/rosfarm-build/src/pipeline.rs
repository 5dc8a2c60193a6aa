//! The sequential build pipeline.
//!
//! One invocation builds exactly one pipeline repository: check out, scan,
//! resolve, install overrides, re-resolve, install system packages,
//! partition, build. Each stage's output feeds the next and the first
//! failure aborts the run.

use crate::checkout;
use crate::driver;
use crate::family::BuildFamily;
use crate::overrides;
use crate::partition::partition;
use crate::resolve::{resolve_dependencies, resolve_mixed_dependencies};
use crate::scan::PackageIndex;
use chrono::Local;
use rosdep_manager::{install_build_dependencies, RosdepResolver};
use rosfarm_core::config::{BuildIdentifier, PipelineConfig};
use rosfarm_core::context::BuildContext;
use rosfarm_core::error::{PipelineError, Result};
use rosfarm_core::process::ProcessRunner;
use tracing::{debug, info};

/// Summary of a completed run, for the caller and for tests.
#[derive(Debug, Clone)]
pub struct BuildReport {
    /// Which family drove the build.
    pub family: BuildFamily,

    /// Dependency names handed to the system package installer.
    pub system_dependencies: Vec<String>,

    /// Override names installed from source.
    pub fulfilled_overrides: Vec<String>,

    /// System package names actually installed.
    pub system_installed: Vec<String>,
}

/// Run the whole pipeline for one build identifier.
pub fn run(
    ctx: &BuildContext,
    config: &PipelineConfig,
    identifier: &BuildIdentifier,
    runner: &dyn ProcessRunner,
) -> Result<BuildReport> {
    let entry = config.lookup(&identifier.full)?;

    info!(
        started = %timestamp(),
        ros_distro = %ctx.ros_distro,
        repository = %identifier.repository,
        "starting pipeline build"
    );
    if let Some(suffix) = &identifier.suffix {
        info!(%suffix, "building repository variant");
    }
    info!(
        url = %entry.url,
        version = entry.version.as_deref().unwrap_or("default"),
        "using source"
    );

    info!("checking out {} from source", identifier.repository);
    checkout::install_sources(ctx, runner, &entry.rosinstall_entry(&identifier.repository))?;

    let mut index = PackageIndex::scan(&ctx.source_root())?;
    log_index(&index);

    let family = index
        .family_of(&identifier.repository)
        .ok_or_else(|| PipelineError::RepositoryNotFound(identifier.repository.clone()))?;
    info!(%family, "repository classified");

    let mut dependencies = resolve_dependencies(&index, family, false);
    debug!(dependencies = %dependencies.join(", "), "resolved build dependencies");

    let outcome = overrides::install_overrides(ctx, runner, entry, &dependencies)?;
    if outcome.installed_any {
        // the installed overrides changed the classification universe
        index = PackageIndex::scan(&ctx.source_root())?;
        match family {
            BuildFamily::Wet => {
                if !index.stacks.is_empty() {
                    return Err(PipelineError::CrossFamilyDependency {
                        package: identifier.repository.clone(),
                        stacks: index.stacks.keys().cloned().collect(),
                    });
                }
                dependencies = resolve_dependencies(&index, BuildFamily::Wet, false);
            }
            BuildFamily::Dry => {
                dependencies = resolve_mixed_dependencies(&index, false);
            }
        }
        dependencies.retain(|dep| !outcome.fulfilled.contains(dep));
        debug!(
            dependencies = %dependencies.join(", "),
            "re-resolved build dependencies after override installation"
        );
    }

    info!(
        started = %timestamp(),
        dependencies = %dependencies.join(", "),
        "installing system build dependencies"
    );
    let resolver = RosdepResolver::new_with_retry(&ctx.ros_distro, runner)?;
    let system_installed = install_build_dependencies(&dependencies, &resolver, runner)?;
    info!(finished = %timestamp(), "system build dependencies installed");

    partition(ctx, &index)?;

    if !index.wet.is_empty() {
        driver::build_wet(ctx, runner)?;
    }
    match family {
        BuildFamily::Dry => driver::build_dry(ctx, runner, &identifier.repository, &index)?,
        BuildFamily::Wet => {}
    }

    info!(finished = %timestamp(), "pipeline build finished");
    Ok(BuildReport {
        family,
        system_dependencies: dependencies,
        fulfilled_overrides: outcome.fulfilled,
        system_installed,
    })
}

fn timestamp() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

fn log_index(index: &PackageIndex) {
    debug!(
        wet = ?index.wet.keys().collect::<Vec<_>>(),
        stacks = ?index.stacks.keys().collect::<Vec<_>>(),
        leaves = ?index.leaves.keys().collect::<Vec<_>>(),
        "classified source tree"
    );
    debug!(
        wet_dependencies = %resolve_dependencies(index, BuildFamily::Wet, false).join(", "),
        dry_dependencies = %resolve_dependencies(index, BuildFamily::Dry, false).join(", "),
        "per-family dependency sets"
    );
}
