//! Source tree scanning and package classification.
//!
//! A scan walks the checked-out source tree and sorts every discovered unit
//! into exactly one of three mappings: wet (catkin) packages, dry stacks,
//! and dry leaf packages. Scans reflect only the current on-disk state;
//! callers rescan after every source-tree mutation, because installing new
//! sources changes the classification universe.

use crate::family::BuildFamily;
use crate::manifest;
use rosfarm_core::error::{PipelineError, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A catkin package discovered by the scan.
#[derive(Debug, Clone)]
pub struct WetPackage {
    pub name: String,
    pub path: PathBuf,
    pub build_depends: Vec<String>,
    pub test_depends: Vec<String>,
}

/// A rosbuild stack discovered by the scan.
#[derive(Debug, Clone)]
pub struct DryStack {
    pub name: String,
    pub path: PathBuf,
    pub depends: Vec<String>,
}

/// A rosbuild leaf package (bare manifest, no stack marker).
#[derive(Debug, Clone)]
pub struct DryPackage {
    pub name: String,
    pub path: PathBuf,
}

/// The classification of one source tree.
#[derive(Debug, Clone, Default)]
pub struct PackageIndex {
    pub wet: BTreeMap<String, WetPackage>,
    pub stacks: BTreeMap<String, DryStack>,
    pub leaves: BTreeMap<String, DryPackage>,
}

impl PackageIndex {
    /// Walk `source_root` and classify every discovered unit.
    ///
    /// An empty or missing tree yields an empty index; ambiguous units and
    /// name collisions are classification errors.
    pub fn scan(source_root: &Path) -> Result<Self> {
        let mut index = PackageIndex::default();
        if source_root.is_dir() {
            walk(source_root, &mut index)?;
        }
        debug!(
            wet = index.wet.len(),
            stacks = index.stacks.len(),
            leaves = index.leaves.len(),
            "scanned {}",
            source_root.display()
        );
        Ok(index)
    }

    /// Which family the named repository builds with, if it is present.
    ///
    /// Only wet packages and dry stacks are buildable targets; leaf packages
    /// are always members of a stack checkout.
    pub fn family_of(&self, name: &str) -> Option<BuildFamily> {
        if self.wet.contains_key(name) {
            Some(BuildFamily::Wet)
        } else if self.stacks.contains_key(name) {
            Some(BuildFamily::Dry)
        } else {
            None
        }
    }

    pub fn is_empty(&self) -> bool {
        self.wet.is_empty() && self.stacks.is_empty() && self.leaves.is_empty()
    }

    fn check_disjoint(&self, name: &str, path: &Path) -> Result<()> {
        if self.wet.contains_key(name)
            || self.stacks.contains_key(name)
            || self.leaves.contains_key(name)
        {
            return Err(PipelineError::Classification(format!(
                "name {} at {} is already classified",
                name,
                path.display()
            )));
        }
        Ok(())
    }
}

fn walk(dir: &Path, index: &mut PackageIndex) -> Result<()> {
    let package_xml = dir.join("package.xml");
    let stack_xml = dir.join("stack.xml");
    let manifest_xml = dir.join("manifest.xml");

    let is_wet = package_xml.is_file();
    let is_dry = stack_xml.is_file() || manifest_xml.is_file();
    if is_wet && is_dry {
        return Err(PipelineError::Classification(format!(
            "{} carries both wet and dry manifest markers",
            dir.display()
        )));
    }

    if is_wet {
        let parsed = manifest::parse_package(&std::fs::read_to_string(&package_xml)?)?;
        index.check_disjoint(&parsed.name, dir)?;
        index.wet.insert(
            parsed.name.clone(),
            WetPackage {
                name: parsed.name,
                path: dir.to_path_buf(),
                build_depends: parsed.build_depends,
                test_depends: parsed.test_depends,
            },
        );
        // catkin packages are leaves of the walk
        return Ok(());
    }

    if stack_xml.is_file() {
        let name = directory_name(dir)?;
        let depends = manifest::parse_stack_depends(&std::fs::read_to_string(&stack_xml)?);
        index.check_disjoint(&name, dir)?;
        index.stacks.insert(
            name.clone(),
            DryStack {
                name,
                path: dir.to_path_buf(),
                depends,
            },
        );
        // keep walking: the stack's member packages live below it
    } else if manifest_xml.is_file() {
        let name = directory_name(dir)?;
        index.check_disjoint(&name, dir)?;
        index.leaves.insert(
            name.clone(),
            DryPackage {
                name,
                path: dir.to_path_buf(),
            },
        );
        return Ok(());
    }

    let mut subdirs: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .filter(|path| {
            path.file_name()
                .map(|name| !name.to_string_lossy().starts_with('.'))
                .unwrap_or(false)
        })
        .collect();
    subdirs.sort();

    for subdir in subdirs {
        walk(&subdir, index)?;
    }
    Ok(())
}

fn directory_name(dir: &Path) -> Result<String> {
    dir.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .ok_or_else(|| {
            PipelineError::Classification(format!("{} has no usable directory name", dir.display()))
        })
}
