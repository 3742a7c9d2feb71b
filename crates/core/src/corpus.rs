//! Recursive traversal of a corpus directory.

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use walkdir::WalkDir;

#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Corpus root not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Corpus root is not a directory: {}", .0.display())]
    NotADirectory(PathBuf),
    /// A directory entry could not be read during traversal.
    #[error("Failed to read {}: {message}", .path.display())]
    Entry { path: PathBuf, message: String },
}

/// Walks a corpus root and yields every regular file beneath it.
///
/// Symlinks are followed so a link to a file counts as a file. Entries are
/// sorted by file name, which keeps the order stable between runs over the
/// same tree. The walker is cheap to build and can be iterated again from the
/// root with another call to [`CorpusWalker::files`].
#[derive(Debug, Clone)]
pub struct CorpusWalker {
    root: PathBuf,
}

impl CorpusWalker {
    /// Validate that `root` exists and is a directory.
    pub fn new(root: impl AsRef<Path>) -> Result<Self, CorpusError> {
        let root = root.as_ref().to_path_buf();
        if !root.exists() {
            return Err(CorpusError::NotFound(root));
        }
        if !root.is_dir() {
            return Err(CorpusError::NotADirectory(root));
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily iterate the files under the root.
    ///
    /// Traversal errors are yielded inline instead of ending the walk, so a
    /// caller can decide whether a vanished or unreadable entry is fatal.
    /// Symlink loops and dangling symlinks are not files and are dropped.
    pub fn files(&self) -> impl Iterator<Item = Result<PathBuf, CorpusError>> + '_ {
        WalkDir::new(&self.root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) if entry.file_type().is_file() => Some(Ok(entry.into_path())),
                Ok(_) => None,
                Err(err) if is_not_a_file(&err) => {
                    tracing::debug!(error = %err, "skipping non-file entry");
                    None
                }
                Err(err) => {
                    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
                    Some(Err(CorpusError::Entry { path, message: err.to_string() }))
                }
            })
    }
}

fn is_not_a_file(err: &walkdir::Error) -> bool {
    err.loop_ancestor().is_some() || err.path().is_some_and(is_dangling_symlink)
}

fn is_dangling_symlink(path: &Path) -> bool {
    let is_link = fs::symlink_metadata(path).is_ok_and(|meta| meta.file_type().is_symlink());
    is_link && fs::metadata(path).is_err()
}

/// Convenience wrapper collecting every file path under `root`.
pub fn collect_files(root: impl AsRef<Path>) -> Result<Vec<PathBuf>, CorpusError> {
    let walker = CorpusWalker::new(root)?;
    walker.files().collect()
}
