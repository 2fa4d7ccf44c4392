//! In-memory storage implementation for testing and small corpora.

use std::collections::{BTreeMap, BTreeSet};
use std::io::{Cursor, Read, Write};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::storage::traits::{
    Storage, StorageConfig, StorageError, StorageInput, StorageOutput, path_components,
};

/// Files and explicitly created directories, keyed by normalized path.
#[derive(Debug, Default)]
struct MemoryTree {
    files: BTreeMap<String, Box<[u8]>>,
    dirs: BTreeSet<String>,
}

impl MemoryTree {
    fn has_descendants(&self, prefix: &str) -> bool {
        self.files.keys().any(|k| k.starts_with(prefix))
            || self.dirs.iter().any(|d| d.starts_with(prefix))
    }

    fn is_dir(&self, path: &str) -> bool {
        path.is_empty() || self.dirs.contains(path) || self.has_descendants(&format!("{path}/"))
    }
}

/// An in-memory storage implementation.
///
/// Directories exist implicitly as path prefixes of stored files, or
/// explicitly through [`Storage::create_dir`].
#[derive(Debug)]
pub struct MemoryStorage {
    tree: Arc<Mutex<MemoryTree>>,
    #[allow(dead_code)]
    config: StorageConfig,
    closed: bool,
}

impl MemoryStorage {
    /// Create a new memory storage.
    pub fn new(config: StorageConfig) -> Self {
        MemoryStorage {
            tree: Arc::new(Mutex::new(MemoryTree::default())),
            config,
            closed: false,
        }
    }

    /// Create a new memory storage with default configuration.
    pub fn new_default() -> Self {
        Self::new(StorageConfig::default())
    }

    /// Store `content` at `path` in one step.
    pub fn put(&self, path: &str, content: impl AsRef<[u8]>) -> Result<()> {
        self.check_closed()?;
        let path = normalize(path)?;
        self.tree
            .lock()
            .files
            .insert(path, content.as_ref().to_vec().into_boxed_slice());
        Ok(())
    }

    /// Get the number of files stored.
    pub fn file_count(&self) -> usize {
        self.tree.lock().files.len()
    }

    /// Get the total size of all files.
    pub fn total_size(&self) -> u64 {
        self.tree
            .lock()
            .files
            .values()
            .map(|data| data.len() as u64)
            .sum()
    }

    fn check_closed(&self) -> Result<()> {
        if self.closed {
            Err(StorageError::StorageClosed.into())
        } else {
            Ok(())
        }
    }
}

fn normalize(path: &str) -> Result<String> {
    Ok(path_components(path)?.join("/"))
}

impl Storage for MemoryStorage {
    fn list(&self, dir: &str) -> Result<Vec<String>> {
        self.check_closed()?;

        let dir = normalize(dir)?;
        let tree = self.tree.lock();
        if !tree.is_dir(&dir) {
            return Err(StorageError::FileNotFound(dir).into());
        }

        let prefix = if dir.is_empty() {
            String::new()
        } else {
            format!("{dir}/")
        };

        let entries: BTreeSet<String> = tree
            .files
            .keys()
            .chain(tree.dirs.iter())
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter_map(|rest| rest.split('/').next())
            .filter(|name| !name.is_empty())
            .map(str::to_string)
            .collect();

        Ok(entries.into_iter().collect())
    }

    fn open_input(&self, path: &str) -> Result<Box<dyn StorageInput>> {
        self.check_closed()?;

        let path = normalize(path)?;
        let tree = self.tree.lock();
        let data = tree
            .files
            .get(&path)
            .ok_or_else(|| StorageError::FileNotFound(path.clone()))?;

        Ok(Box::new(MemoryInput::new(data.to_vec())))
    }

    fn create_output(&self, path: &str) -> Result<Box<dyn StorageOutput>> {
        self.check_closed()?;

        let path = normalize(path)?;
        if path.is_empty() || self.tree.lock().is_dir(&path) {
            return Err(StorageError::InvalidOperation(format!(
                "Cannot write to a directory: {path}"
            ))
            .into());
        }

        Ok(Box::new(MemoryOutput::new(path, Arc::clone(&self.tree))))
    }

    fn create_dir(&self, path: &str) -> Result<()> {
        self.check_closed()?;

        let path = normalize(path)?;
        if !path.is_empty() {
            self.tree.lock().dirs.insert(path);
        }
        Ok(())
    }

    fn delete(&self, path: &str, recursive: bool) -> Result<()> {
        self.check_closed()?;

        let path = normalize(path)?;
        if path.is_empty() {
            return Err(StorageError::InvalidOperation(
                "Refusing to delete the storage root".to_string(),
            )
            .into());
        }

        let mut tree = self.tree.lock();
        if tree.files.remove(&path).is_some() {
            return Ok(());
        }

        let prefix = format!("{path}/");
        if tree.has_descendants(&prefix) && !recursive {
            return Err(StorageError::InvalidOperation(format!(
                "Directory is not empty: {path}"
            ))
            .into());
        }

        tree.files.retain(|k, _| !k.starts_with(&prefix));
        tree.dirs.retain(|d| d != &path && !d.starts_with(&prefix));
        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        if self.closed {
            return false;
        }

        match normalize(path) {
            Ok(path) => {
                let tree = self.tree.lock();
                tree.files.contains_key(&path) || tree.is_dir(&path)
            }
            Err(_) => false,
        }
    }

    fn is_dir(&self, path: &str) -> bool {
        if self.closed {
            return false;
        }

        match normalize(path) {
            Ok(path) => self.tree.lock().is_dir(&path),
            Err(_) => false,
        }
    }

    fn file_size(&self, path: &str) -> Result<u64> {
        self.check_closed()?;

        let path = normalize(path)?;
        let tree = self.tree.lock();
        let data = tree
            .files
            .get(&path)
            .ok_or_else(|| StorageError::FileNotFound(path.clone()))?;

        Ok(data.len() as u64)
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// A memory-based input implementation.
#[derive(Debug)]
pub struct MemoryInput {
    cursor: Cursor<Vec<u8>>,
    size: u64,
}

impl MemoryInput {
    fn new(data: Vec<u8>) -> Self {
        let size = data.len() as u64;
        MemoryInput {
            cursor: Cursor::new(data),
            size,
        }
    }
}

impl Read for MemoryInput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.cursor.read(buf)
    }
}

impl StorageInput for MemoryInput {
    fn size(&self) -> Result<u64> {
        Ok(self.size)
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// A memory-based output implementation.
///
/// Content becomes visible in the storage when the output is closed or dropped.
#[derive(Debug)]
pub struct MemoryOutput {
    path: String,
    buffer: Vec<u8>,
    tree: Arc<Mutex<MemoryTree>>,
    closed: bool,
}

impl MemoryOutput {
    fn new(path: String, tree: Arc<Mutex<MemoryTree>>) -> Self {
        MemoryOutput {
            path,
            buffer: Vec::new(),
            tree,
            closed: false,
        }
    }
}

impl Write for MemoryOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if self.closed {
            return Err(std::io::Error::other("Output is closed"));
        }

        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl StorageOutput for MemoryOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        Ok(())
    }

    fn position(&self) -> Result<u64> {
        Ok(self.buffer.len() as u64)
    }

    fn close(&mut self) -> Result<()> {
        if !self.closed {
            let data = std::mem::take(&mut self.buffer).into_boxed_slice();
            self.tree.lock().files.insert(self.path.clone(), data);
            self.closed = true;
        }
        Ok(())
    }
}

impl Drop for MemoryOutput {
    fn drop(&mut self) {
        let _ = self.close();
    }
}
