//! Filesystem collaborator used by the generator.
//!
//! The generator never touches `std::fs` directly; it goes through
//! [`Filesystem`] so every mutation is in one place.

use crate::tree::Directory;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

pub trait Filesystem {
    /// Create `path` and any missing parents.
    fn mkdirs(&mut self, path: &Path) -> Result<()>;
    /// Remove everything inside `path`, keeping `path` itself.
    fn clear_dir(&mut self, path: &Path) -> Result<()>;
    /// Snapshot the tree rooted at `path`. A missing directory is empty.
    fn scan_dirs(&self, path: &Path) -> Result<Directory>;
    /// Write generated declaration text (already pretty-printed).
    fn write_declaration(&mut self, path: &Path, code: &str) -> Result<()>;
    /// Write generated native source verbatim.
    fn write_native(&mut self, path: &Path, code: &str) -> Result<()>;
}

/// The real disk.
#[derive(Debug, Default)]
pub struct DiskFs;

impl Filesystem for DiskFs {
    fn mkdirs(&mut self, path: &Path) -> Result<()> {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))
    }

    fn clear_dir(&mut self, path: &Path) -> Result<()> {
        let entries = fs::read_dir(path)
            .with_context(|| format!("failed to read directory: {}", path.display()))?;
        for entry in entries {
            let entry = entry?;
            let p = entry.path();
            let removed = if entry.file_type()?.is_dir() {
                fs::remove_dir_all(&p)
            } else {
                fs::remove_file(&p)
            };
            removed.with_context(|| format!("failed to remove {}", p.display()))?;
        }
        Ok(())
    }

    fn scan_dirs(&self, path: &Path) -> Result<Directory> {
        let mut root = Directory::new(path);
        if !path.is_dir() {
            return Ok(root);
        }
        // Explicit stack of (directory on disk, route of names from the root).
        let mut pending: Vec<Vec<String>> = vec![Vec::new()];
        while let Some(route) = pending.pop() {
            let mut node = &mut root;
            for name in &route {
                node = node.subdir(name);
            }
            let disk_path = node.path.clone();
            let entries = fs::read_dir(&disk_path)
                .with_context(|| format!("failed to read directory: {}", disk_path.display()))?;
            for entry in entries {
                let entry = entry?;
                let name = entry.file_name().to_string_lossy().into_owned();
                let file_type = entry.file_type()?;
                if file_type.is_dir() {
                    node.subdir(&name);
                    let mut child = route.clone();
                    child.push(name);
                    pending.push(child);
                } else if file_type.is_file() {
                    node.add_file(&name);
                }
            }
        }
        Ok(root)
    }

    fn write_declaration(&mut self, path: &Path, code: &str) -> Result<()> {
        fs::write(path, code).with_context(|| format!("failed to write {}", path.display()))
    }

    fn write_native(&mut self, path: &Path, code: &str) -> Result<()> {
        fs::write(path, code).with_context(|| format!("failed to write {}", path.display()))
    }
}

/// Normalize generated declaration text.
///
/// Strips trailing whitespace, collapses runs of blank lines into one,
/// drops leading blank lines and ends with exactly one newline. Lines inside
/// a multi-line `/** ... */` block carry overlay doc text and are kept as
/// written. Idempotent.
pub fn prettify(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut blank_run = false;
    let mut in_doc = false;
    for raw in code.lines() {
        if in_doc {
            out.push_str(raw);
            out.push('\n');
            in_doc = !raw.contains("*/");
            continue;
        }
        let line = raw.trim_end();
        if line.is_empty() {
            if !out.is_empty() {
                blank_run = true;
            }
            continue;
        }
        if blank_run {
            out.push('\n');
            blank_run = false;
        }
        out.push_str(line);
        out.push('\n');
        let opener = line.trim_start();
        in_doc = opener.starts_with("/**") && !opener.contains("*/");
    }
    out
}
