use std::env;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};

pub mod commands;

/// Make a user-supplied path absolute against the current working directory.
///
/// Symlinks are left in place so a linked corpus keeps the name and parent
/// the user typed. `.` and `..` components are folded lexically.
pub fn absolute_or_current(root: &str) -> Result<PathBuf> {
    let path = Path::new(root);
    let joined = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().context("Failed to get current directory")?.join(path)
    };

    let mut normalized = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}
