//! User-declared dependency override installation.
//!
//! Overrides pin selected dependencies to version-controlled checkouts
//! instead of system packages. Two passes build the install manifest: first
//! the overrides the resolved dependency set actually asks for, then every
//! remaining declared override, since a user may force-install a dependency
//! that is not an immediate build dependency (e.g. a transitive pin).

use crate::checkout;
use rosfarm_core::config::{RepoEntry, SourceOverride};
use rosfarm_core::context::BuildContext;
use rosfarm_core::error::{PipelineError, Result};
use rosfarm_core::process::ProcessRunner;
use std::collections::{BTreeMap, BTreeSet};
use tracing::info;

/// What the override pass did.
#[derive(Debug, Clone)]
pub struct OverrideOutcome {
    /// Names installed from source, in install order.
    pub fulfilled: Vec<String>,

    /// Whether anything was checked out (and the index therefore stale).
    pub installed_any: bool,
}

/// Install the target repository's declared overrides.
pub fn install_overrides(
    ctx: &BuildContext,
    runner: &dyn ProcessRunner,
    entry: &RepoEntry,
    resolved: &[String],
) -> Result<OverrideOutcome> {
    let declared = &entry.dependencies;
    let mut manifest = String::new();
    let mut fulfilled: Vec<String> = Vec::new();

    // overrides the resolved dependency set asks for
    for dep in resolved {
        if let Some(pin) = declared.get(dep) {
            info!(dependency = %dep, "installing user-declared build dependency from source");
            manifest.push_str(&pin.rosinstall_entry(dep));
            fulfilled.push(dep.clone());
        }
    }

    // forced indirect overrides: declared but not required by the resolved set
    for (name, pin) in declared {
        if !fulfilled.contains(name) {
            info!(dependency = %name, "installing additional user-declared build dependency from source");
            manifest.push_str(&pin.rosinstall_entry(name));
            fulfilled.push(name.clone());
        }
    }

    let installed_any = !manifest.is_empty();
    if installed_any {
        checkout::install_sources(ctx, runner, &manifest)?;
    }

    verify_fulfilled(declared, &fulfilled)?;

    Ok(OverrideOutcome {
        fulfilled,
        installed_any,
    })
}

/// Assert that the fulfilled set covers the declared override keys exactly.
fn verify_fulfilled(
    declared: &BTreeMap<String, SourceOverride>,
    fulfilled: &[String],
) -> Result<()> {
    let declared_names: BTreeSet<&String> = declared.keys().collect();
    let fulfilled_names: BTreeSet<&String> = fulfilled.iter().collect();
    if declared_names != fulfilled_names {
        return Err(PipelineError::UnresolvedOverride {
            declared: declared_names.into_iter().cloned().collect(),
            fulfilled: fulfilled_names.into_iter().cloned().collect(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rosfarm_core::process::fakes::ScriptedRunner;
    use tempfile::tempdir;

    fn pin(url: &str) -> SourceOverride {
        SourceOverride {
            scm: "git".to_string(),
            url: url.to_string(),
            version: Some("master".to_string()),
        }
    }

    fn entry(overrides: &[(&str, &str)]) -> RepoEntry {
        RepoEntry {
            scm: "git".to_string(),
            url: "git://example/repo".to_string(),
            version: Some("master".to_string()),
            poll: false,
            dependencies: overrides
                .iter()
                .map(|(name, url)| (name.to_string(), pin(url)))
                .collect(),
        }
    }

    fn scratch_context() -> (tempfile::TempDir, BuildContext) {
        let dir = tempdir().unwrap();
        let workspace = dir.path().join("workspace");
        std::fs::create_dir_all(&workspace).unwrap();
        let ctx = BuildContext::new(&workspace, "groovy", "").with_temp_root(dir.path().join("tmp"));
        (dir, ctx)
    }

    #[test]
    fn no_declared_overrides_is_a_no_op() {
        let (_dir, ctx) = scratch_context();
        let runner = ScriptedRunner::new();
        let entry = entry(&[]);

        let outcome =
            install_overrides(&ctx, &runner, &entry, &["bar".to_string(), "baz".to_string()])
                .unwrap();

        assert!(outcome.fulfilled.is_empty());
        assert!(!outcome.installed_any);
        assert!(!runner.invoked("rosinstall"));
    }

    #[test]
    fn resolved_overrides_install_before_forced_ones() {
        let (_dir, ctx) = scratch_context();
        let runner = ScriptedRunner::new();
        // declaration order (BTreeMap) differs from resolved order on purpose
        let entry = entry(&[
            ("alpha_pin", "git://example/alpha"),
            ("zeta_dep", "git://example/zeta"),
        ]);
        let resolved = vec!["zeta_dep".to_string(), "unrelated".to_string()];

        let outcome = install_overrides(&ctx, &runner, &entry, &resolved).unwrap();

        assert_eq!(outcome.fulfilled, vec!["zeta_dep", "alpha_pin"]);
        assert!(outcome.installed_any);

        let manifest = std::fs::read_to_string(ctx.rosinstall_file()).unwrap();
        let zeta = manifest.find("zeta_dep").unwrap();
        let alpha = manifest.find("alpha_pin").unwrap();
        assert!(zeta < alpha);
    }

    #[test]
    fn forced_indirect_override_is_still_installed() {
        let (_dir, ctx) = scratch_context();
        let runner = ScriptedRunner::new();
        let entry = entry(&[("bar", "git://example/bar")]);

        // bar is not in the resolved set
        let outcome = install_overrides(&ctx, &runner, &entry, &[]).unwrap();

        assert_eq!(outcome.fulfilled, vec!["bar"]);
        assert!(outcome.installed_any);
        assert!(runner.invoked("rosinstall"));
    }

    #[test]
    fn checkout_failure_propagates() {
        let (_dir, ctx) = scratch_context();
        let runner = ScriptedRunner::new();
        runner.fail("rosinstall", 1, "could not clone");
        let entry = entry(&[("bar", "git://example/bar")]);

        let err = install_overrides(&ctx, &runner, &entry, &[]).unwrap_err();
        assert!(matches!(err, PipelineError::ToolInvocation { .. }));
    }

    #[test]
    fn fulfilled_must_cover_declared_exactly() {
        let declared: BTreeMap<String, SourceOverride> = [
            ("bar".to_string(), pin("git://example/bar")),
            ("baz".to_string(), pin("git://example/baz")),
        ]
        .into_iter()
        .collect();

        assert!(verify_fulfilled(&declared, &["baz".to_string(), "bar".to_string()]).is_ok());

        let err = verify_fulfilled(&declared, &["bar".to_string()]).unwrap_err();
        match err {
            PipelineError::UnresolvedOverride {
                declared,
                fulfilled,
            } => {
                assert_eq!(declared, vec!["bar", "baz"]);
                assert_eq!(fulfilled, vec!["bar"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
