use std::env;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("{} not found at the configured path", .0.display())]
    MissingFile(PathBuf),
    #[error("{0} is not installed or not found in PATH")]
    NotInPath(String),
}

/// Resolve a configured executable to an existing file.
///
/// Values containing a path separator must name an existing file; bare names
/// are searched on `PATH`.
pub fn resolve_executable(program: &Path) -> Result<PathBuf, ResolveError> {
    if program.components().count() > 1 || program.is_absolute() {
        if program.is_file() {
            return Ok(program.to_path_buf());
        }
        return Err(ResolveError::MissingFile(program.to_path_buf()));
    }

    let name = program.to_string_lossy().to_string();
    find_in_path(&name).ok_or(ResolveError::NotInPath(name))
}

/// Search the directories on `PATH` for `executable`.
pub fn find_in_path(executable: &str) -> Option<PathBuf> {
    env::var_os("PATH").and_then(|paths| {
        env::split_paths(&paths).find_map(|dir| {
            let candidate = dir.join(executable);
            if candidate.is_file() {
                return Some(candidate);
            }
            if cfg!(windows) && candidate.extension().is_none() {
                let exe = candidate.with_extension("exe");
                if exe.is_file() {
                    return Some(exe);
                }
            }
            None
        })
    })
}
