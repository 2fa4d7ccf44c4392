//! Storage abstraction trait and common types.

use std::io::{BufRead, BufReader, Read, Write};

use serde::{Deserialize, Serialize};

use crate::error::{CorpusBayesError, Result};

/// A trait for storage backends holding the corpus, intermediate counts and models.
///
/// Paths are `/`-separated names relative to the storage root, e.g. `"USA/doc_17"`.
/// The empty path `""` names the root itself.
pub trait Storage: Send + Sync + std::fmt::Debug {
    /// List the entry names (files and directories) directly under `dir`, sorted.
    fn list(&self, dir: &str) -> Result<Vec<String>>;

    /// Open a file for reading.
    fn open_input(&self, path: &str) -> Result<Box<dyn StorageInput>>;

    /// Create (or truncate) a file for writing. Missing parent directories are created.
    fn create_output(&self, path: &str) -> Result<Box<dyn StorageOutput>>;

    /// Create a directory and any missing parents.
    fn create_dir(&self, path: &str) -> Result<()>;

    /// Delete a file or directory. Deleting a missing path is not an error.
    ///
    /// A non-empty directory is only removed when `recursive` is set.
    fn delete(&self, path: &str, recursive: bool) -> Result<()>;

    /// Check if a file or directory exists.
    fn exists(&self, path: &str) -> bool;

    /// Check if the path names a directory.
    fn is_dir(&self, path: &str) -> bool;

    /// Get the size of a file in bytes.
    fn file_size(&self, path: &str) -> Result<u64>;

    /// Close the storage and release resources.
    fn close(&mut self) -> Result<()>;
}

/// A trait for reading data from storage.
pub trait StorageInput: Read + Send + std::fmt::Debug {
    /// Get the size of the input stream.
    fn size(&self) -> Result<u64>;

    /// Close the input stream.
    fn close(&mut self) -> Result<()>;
}

/// A trait for writing data to storage.
pub trait StorageOutput: Write + Send + std::fmt::Debug {
    /// Flush and sync the output to storage.
    fn flush_and_sync(&mut self) -> Result<()>;

    /// Get the current position in the output stream.
    fn position(&self) -> Result<u64>;

    /// Close the output stream, making its content visible to readers.
    fn close(&mut self) -> Result<()>;
}

impl StorageOutput for Box<dyn StorageOutput> {
    fn flush_and_sync(&mut self) -> Result<()> {
        self.as_mut().flush_and_sync()
    }

    fn position(&self) -> Result<u64> {
        self.as_ref().position()
    }

    fn close(&mut self) -> Result<()> {
        self.as_mut().close()
    }
}

impl StorageInput for Box<dyn StorageInput> {
    fn size(&self) -> Result<u64> {
        self.as_ref().size()
    }

    fn close(&mut self) -> Result<()> {
        self.as_mut().close()
    }
}

/// Open `path` and return an iterator over its lines.
///
/// Line terminators (`\n` and `\r\n`) are stripped. Read failures surface as
/// `Err` items instead of ending the iteration early.
pub fn read_lines(
    storage: &dyn Storage,
    path: &str,
) -> Result<impl Iterator<Item = Result<String>> + use<>> {
    let input = storage.open_input(path)?;
    Ok(BufReader::new(input)
        .lines()
        .map(|line| line.map_err(CorpusBayesError::from)))
}

/// Join two storage paths with a single `/`.
pub fn join_path(parent: &str, child: &str) -> String {
    let parent = parent.trim_end_matches('/');
    let child = child.trim_start_matches('/');
    if parent.is_empty() {
        child.to_string()
    } else if child.is_empty() {
        parent.to_string()
    } else {
        format!("{parent}/{child}")
    }
}

/// Whether `path` equals `ancestor` or lies below it, comparing whole components.
///
/// The empty path is the storage root and is an ancestor of every path.
pub fn is_within(path: &str, ancestor: &str) -> bool {
    let components = |p: &str| -> Vec<String> {
        p.split('/')
            .filter(|c| !c.is_empty() && *c != ".")
            .map(str::to_string)
            .collect()
    };
    let path = components(path);
    let ancestor = components(ancestor);
    path.starts_with(&ancestor)
}

/// Return the final component of a storage path.
pub fn file_name(path: &str) -> &str {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(path)
}

/// Split a storage path into normalized components, rejecting `..` and absolute paths.
pub(crate) fn path_components(path: &str) -> Result<Vec<&str>> {
    if path.starts_with('/') {
        return Err(CorpusBayesError::invalid_argument(format!(
            "Storage paths must be relative: {path}"
        )));
    }

    let mut components = Vec::new();
    for component in path.split('/') {
        match component {
            "" | "." => continue,
            ".." => {
                return Err(CorpusBayesError::invalid_argument(format!(
                    "Storage paths must not contain '..': {path}"
                )));
            }
            c => components.push(c),
        }
    }
    Ok(components)
}

/// Configuration for storage backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Buffer size for I/O operations.
    pub buffer_size: usize,

    /// Whether to sync writes immediately.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            buffer_size: 65536, // 64KB
            sync_writes: false,
        }
    }
}

/// Error types specific to storage operations.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// File or directory not found.
    FileNotFound(String),

    /// I/O error.
    IoError(String),

    /// Storage is closed.
    StorageClosed,

    /// Invalid operation.
    InvalidOperation(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::FileNotFound(name) => write!(f, "File not found: {name}"),
            StorageError::IoError(msg) => write!(f, "I/O error: {msg}"),
            StorageError::StorageClosed => write!(f, "Storage is closed"),
            StorageError::InvalidOperation(msg) => write!(f, "Invalid operation: {msg}"),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<StorageError> for CorpusBayesError {
    fn from(err: StorageError) -> Self {
        CorpusBayesError::storage(err.to_string())
    }
}
