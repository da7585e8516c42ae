//! In-memory mirror of a generated output tree and the reference walk.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Directories with this name contribute no reference lines of their own.
pub const EXCLUDED_DIR: &str = "dist";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Directory {
    pub name: String,
    pub path: PathBuf,
    pub files: BTreeMap<String, FileEntry>,
    pub dirs: BTreeMap<String, Directory>,
}

impl Directory {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Directory {
            name,
            path,
            ..Default::default()
        }
    }

    pub fn add_file(&mut self, name: &str) {
        let path = self.path.join(name);
        self.files.insert(
            name.to_string(),
            FileEntry {
                name: name.to_string(),
                path,
            },
        );
    }

    /// Get or create the child directory `name`.
    pub fn subdir(&mut self, name: &str) -> &mut Directory {
        let path = self.path.join(name);
        self.dirs
            .entry(name.to_string())
            .or_insert_with(|| Directory::new(path))
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty() && self.dirs.values().all(Directory::is_empty)
    }
}

/// Collect `/// <reference path="..." />` lines for every file under `tree`.
///
/// Depth-first: a directory's files (sorted by name) come before its
/// subdirectories (sorted by name). Directories named `skip_label` add no
/// files of their own but are still descended into. Paths are made
/// relative to `output_root`. The result is sorted again as a whole.
pub fn build_reference_list(tree: &Directory, skip_label: &str, output_root: &Path) -> Vec<String> {
    let mut references = Vec::new();
    let mut stack: Vec<&Directory> = vec![tree];

    while let Some(dir) = stack.pop() {
        if dir.name != skip_label {
            let mut names: Vec<&String> = dir.files.keys().collect();
            names.sort();
            for name in names {
                let file = &dir.files[name];
                references.push(format!(
                    "/// <reference path=\"{}\" />",
                    relative_path(&file.path, output_root)
                ));
            }
        }
        let mut subdirs: Vec<&String> = dir.dirs.keys().collect();
        subdirs.sort();
        // Reverse so the smallest name is popped first.
        for name in subdirs.into_iter().rev() {
            stack.push(&dir.dirs[name]);
        }
    }

    references.sort();
    references
}

/// `/root/output/lua/a/b.d.ts` relative to `/root/output` → `lua/a/b.d.ts`.
/// Always `/`-separated.
fn relative_path(path: &Path, root: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
