//! Non-local build dependency resolution.
//!
//! Resolution is scoped to one packaging family per computation: wet
//! resolution walks per-package build (and optionally test) dependency
//! declarations, dry resolution walks stack-level declarations. Names that
//! are local to the mappings in scope resolve to nothing; everything else is
//! returned in first-encounter order without duplicates.

use crate::family::BuildFamily;
use crate::scan::PackageIndex;
use std::collections::BTreeSet;

/// Resolve the external dependency names of the target's family.
pub fn resolve_dependencies(
    index: &PackageIndex,
    family: BuildFamily,
    include_test: bool,
) -> Vec<String> {
    match family {
        BuildFamily::Wet => collect(index, true, false, include_test),
        BuildFamily::Dry => collect(index, false, true, include_test),
    }
}

/// Resolve across both families at once.
///
/// Used after override installation for dry targets, whose newly installed
/// overrides may have brought wet packages into the tree.
pub fn resolve_mixed_dependencies(index: &PackageIndex, include_test: bool) -> Vec<String> {
    collect(index, true, true, include_test)
}

fn collect(
    index: &PackageIndex,
    include_wet: bool,
    include_dry: bool,
    include_test: bool,
) -> Vec<String> {
    let mut local: BTreeSet<&str> = BTreeSet::new();
    if include_wet {
        local.extend(index.wet.keys().map(String::as_str));
    }
    if include_dry {
        local.extend(index.stacks.keys().map(String::as_str));
    }

    let mut seen: BTreeSet<String> = BTreeSet::new();
    let mut resolved: Vec<String> = Vec::new();
    let mut push = |name: &str| {
        if !local.contains(name) && seen.insert(name.to_string()) {
            resolved.push(name.to_string());
        }
    };

    if include_wet {
        for package in index.wet.values() {
            for dep in &package.build_depends {
                push(dep);
            }
            if include_test {
                for dep in &package.test_depends {
                    push(dep);
                }
            }
        }
    }
    if include_dry {
        for stack in index.stacks.values() {
            for dep in &stack.depends {
                push(dep);
            }
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::{DryStack, WetPackage};
    use std::path::PathBuf;

    fn wet(name: &str, build: &[&str], test: &[&str]) -> WetPackage {
        WetPackage {
            name: name.to_string(),
            path: PathBuf::from(name),
            build_depends: build.iter().map(|s| s.to_string()).collect(),
            test_depends: test.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn stack(name: &str, depends: &[&str]) -> DryStack {
        DryStack {
            name: name.to_string(),
            path: PathBuf::from(name),
            depends: depends.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn index(wets: Vec<WetPackage>, stacks: Vec<DryStack>) -> PackageIndex {
        let mut index = PackageIndex::default();
        for package in wets {
            index.wet.insert(package.name.clone(), package);
        }
        for entry in stacks {
            index.stacks.insert(entry.name.clone(), entry);
        }
        index
    }

    #[test]
    fn wet_resolution_keeps_first_encounter_order_without_duplicates() {
        let index = index(
            vec![
                wet("foo", &["bar", "baz"], &[]),
                wet("quux", &["baz", "bar", "corge"], &[]),
            ],
            vec![],
        );
        let deps = resolve_dependencies(&index, BuildFamily::Wet, false);
        assert_eq!(deps, vec!["bar", "baz", "corge"]);
    }

    #[test]
    fn local_names_never_resolve() {
        let index = index(
            vec![wet("foo", &["bar", "foo_msgs"], &[]), wet("foo_msgs", &[], &[])],
            vec![],
        );
        let deps = resolve_dependencies(&index, BuildFamily::Wet, false);
        assert_eq!(deps, vec!["bar"]);
        for dep in &deps {
            assert!(!index.wet.contains_key(dep));
        }
    }

    #[test]
    fn test_dependencies_only_on_request() {
        let index = index(vec![wet("foo", &["bar"], &["rostest"])], vec![]);
        assert_eq!(
            resolve_dependencies(&index, BuildFamily::Wet, false),
            vec!["bar"]
        );
        assert_eq!(
            resolve_dependencies(&index, BuildFamily::Wet, true),
            vec!["bar", "rostest"]
        );
    }

    #[test]
    fn dry_resolution_walks_stack_declarations() {
        let index = index(
            vec![],
            vec![
                stack("cob_driver", &["ros_comm", "cob_common"]),
                stack("cob_common", &["ros_comm"]),
            ],
        );
        let deps = resolve_dependencies(&index, BuildFamily::Dry, false);
        // cob_common is local to the stack mapping
        assert_eq!(deps, vec!["ros_comm"]);
    }

    #[test]
    fn dry_resolution_ignores_wet_declarations_and_vice_versa() {
        let index = index(
            vec![wet("wet_pkg", &["wet_dep"], &[])],
            vec![stack("dry_stack", &["dry_dep"])],
        );
        assert_eq!(
            resolve_dependencies(&index, BuildFamily::Wet, false),
            vec!["wet_dep"]
        );
        assert_eq!(
            resolve_dependencies(&index, BuildFamily::Dry, false),
            vec!["dry_dep"]
        );
    }

    #[test]
    fn mixed_resolution_unions_both_walks_and_both_local_sets() {
        let index = index(
            vec![wet("wet_pkg", &["shared_dep", "dry_stack"], &[])],
            vec![stack("dry_stack", &["shared_dep", "wet_pkg"])],
        );
        let deps = resolve_mixed_dependencies(&index, false);
        // both local names drop out, the shared external survives once
        assert_eq!(deps, vec!["shared_dep"]);
    }

    #[test]
    fn resolution_is_idempotent_on_an_unchanged_index() {
        let index = index(
            vec![wet("foo", &["bar", "baz"], &["rostest"])],
            vec![stack("dry", &["qux"])],
        );
        let first = resolve_mixed_dependencies(&index, true);
        let second = resolve_mixed_dependencies(&index, true);
        assert_eq!(first, second);
    }

    #[test]
    fn empty_index_resolves_to_nothing() {
        let index = PackageIndex::default();
        assert!(resolve_dependencies(&index, BuildFamily::Wet, false).is_empty());
        assert!(resolve_dependencies(&index, BuildFamily::Dry, false).is_empty());
    }
}
