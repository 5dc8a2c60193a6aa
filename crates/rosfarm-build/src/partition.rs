//! Workspace partitioning into wet and dry build roots.
//!
//! The native tools each want a homogeneous tree: cmake configures the wet
//! root, rosmake walks the dry root. Partitioning moves every classified
//! top-level checkout into its family's root and leaves everything else
//! (override metadata and similar auxiliaries) where it is.

use crate::scan::PackageIndex;
use rosfarm_core::context::BuildContext;
use rosfarm_core::error::Result;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Split the source root into the wet and dry build roots.
pub fn partition(ctx: &BuildContext, index: &PackageIndex) -> Result<()> {
    info!("separating installed repositories into wet and dry");
    let source_root = ctx.source_root();
    let wet_root = ctx.wet_root();
    let dry_root = ctx.dry_root();
    fs::create_dir_all(&wet_root)?;
    fs::create_dir_all(&dry_root)?;

    let mut top_level: Vec<PathBuf> = fs::read_dir(&source_root)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    top_level.sort();

    for dir in top_level {
        if dir == wet_root || dir == dry_root {
            continue;
        }
        let Some(name) = dir.file_name().map(|n| n.to_string_lossy().to_string()) else {
            continue;
        };
        if index.wet.contains_key(&name) {
            fs::rename(&dir, wet_root.join(&name))?;
        } else if index.stacks.contains_key(&name) || index.leaves.contains_key(&name) {
            fs::rename(&dir, dry_root.join(&name))?;
        } else {
            debug!(directory = %name, "leaving unclassified directory in place");
        }
    }
    Ok(())
}
