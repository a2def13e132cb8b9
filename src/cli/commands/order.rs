//! CLI implementation for `crossroot order` command

use std::path::Path;

use anyhow::{Context, Result};

use super::load_manifest;
use crate::core::scheduler::ordered_nodes;

/// Print the build order, one `priority name` line per package
pub fn execute(manifest_path: &Path) -> Result<()> {
    let manifest = load_manifest(manifest_path)?;
    let nodes = ordered_nodes(&manifest.packages).context("Failed to compute build order")?;

    for (position, node) in nodes.iter().enumerate() {
        println!("{:>3}. {:<24} priority {}", position + 1, node.name, node.priority);
    }

    Ok(())
}
