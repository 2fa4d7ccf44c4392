//! File-based storage implementation.

use std::fs::{File, OpenOptions};
use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

use crate::error::{CorpusBayesError, Result};
use crate::storage::traits::{
    Storage, StorageConfig, StorageError, StorageInput, StorageOutput, path_components,
};

/// A storage rooted at a directory of the local file system.
#[derive(Debug)]
pub struct FileStorage {
    /// The root directory for storage.
    directory: PathBuf,
    /// Storage configuration.
    config: StorageConfig,
    /// Whether the storage is closed.
    closed: bool,
}

impl FileStorage {
    /// Create a new file storage in the given directory.
    pub fn new<P: AsRef<Path>>(directory: P, config: StorageConfig) -> Result<Self> {
        let directory = directory.as_ref().to_path_buf();

        if !directory.exists() {
            std::fs::create_dir_all(&directory).map_err(|e| {
                CorpusBayesError::storage(format!("Failed to create directory: {e}"))
            })?;
        }

        if !directory.is_dir() {
            return Err(CorpusBayesError::storage(format!(
                "Path is not a directory: {}",
                directory.display()
            )));
        }

        Ok(FileStorage {
            directory,
            config,
            closed: false,
        })
    }

    /// The root directory of this storage.
    pub fn root(&self) -> &Path {
        &self.directory
    }

    /// Get the full path for a storage path.
    fn file_path(&self, path: &str) -> Result<PathBuf> {
        let mut full = self.directory.clone();
        for component in path_components(path)? {
            full.push(component);
        }
        Ok(full)
    }

    /// Check if the storage is closed.
    fn check_closed(&self) -> Result<()> {
        if self.closed {
            Err(StorageError::StorageClosed.into())
        } else {
            Ok(())
        }
    }
}

fn map_io_error(path: &str, e: std::io::Error) -> CorpusBayesError {
    if e.kind() == ErrorKind::NotFound {
        StorageError::FileNotFound(path.to_string()).into()
    } else {
        StorageError::IoError(format!("{path}: {e}")).into()
    }
}

impl Storage for FileStorage {
    fn list(&self, dir: &str) -> Result<Vec<String>> {
        self.check_closed()?;

        let full = self.file_path(dir)?;
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(&full).map_err(|e| map_io_error(dir, e))? {
            let entry = entry.map_err(|e| map_io_error(dir, e))?;
            if let Some(name) = entry.file_name().to_str() {
                entries.push(name.to_string());
            } else {
                log::warn!(
                    "Skipping non UTF-8 entry in {}: {:?}",
                    full.display(),
                    entry.file_name()
                );
            }
        }

        entries.sort();
        Ok(entries)
    }

    fn open_input(&self, path: &str) -> Result<Box<dyn StorageInput>> {
        self.check_closed()?;

        let full = self.file_path(path)?;
        if full.is_dir() {
            return Err(StorageError::InvalidOperation(format!(
                "Cannot open directory for reading: {path}"
            ))
            .into());
        }
        let file = File::open(&full).map_err(|e| map_io_error(path, e))?;

        Ok(Box::new(FileInput::new(file, self.config.buffer_size)?))
    }

    fn create_output(&self, path: &str) -> Result<Box<dyn StorageOutput>> {
        self.check_closed()?;

        let full = self.file_path(path)?;
        if let Some(parent) = full.parent() {
            std::fs::create_dir_all(parent).map_err(|e| map_io_error(path, e))?;
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&full)
            .map_err(|e| map_io_error(path, e))?;

        Ok(Box::new(FileOutput::new(
            file,
            self.config.buffer_size,
            self.config.sync_writes,
        )))
    }

    fn create_dir(&self, path: &str) -> Result<()> {
        self.check_closed()?;

        let full = self.file_path(path)?;
        std::fs::create_dir_all(&full).map_err(|e| map_io_error(path, e))
    }

    fn delete(&self, path: &str, recursive: bool) -> Result<()> {
        self.check_closed()?;

        let full = self.file_path(path)?;
        if full == self.directory {
            return Err(StorageError::InvalidOperation(
                "Refusing to delete the storage root".to_string(),
            )
            .into());
        }
        if !full.exists() {
            return Ok(());
        }

        if full.is_dir() {
            let is_empty = std::fs::read_dir(&full)
                .map_err(|e| map_io_error(path, e))?
                .next()
                .is_none();
            if recursive {
                std::fs::remove_dir_all(&full).map_err(|e| map_io_error(path, e))?;
            } else if is_empty {
                std::fs::remove_dir(&full).map_err(|e| map_io_error(path, e))?;
            } else {
                return Err(StorageError::InvalidOperation(format!(
                    "Directory is not empty: {path}"
                ))
                .into());
            }
        } else {
            std::fs::remove_file(&full).map_err(|e| map_io_error(path, e))?;
        }

        Ok(())
    }

    fn exists(&self, path: &str) -> bool {
        if self.closed {
            return false;
        }

        self.file_path(path).map(|p| p.exists()).unwrap_or(false)
    }

    fn is_dir(&self, path: &str) -> bool {
        if self.closed {
            return false;
        }

        self.file_path(path).map(|p| p.is_dir()).unwrap_or(false)
    }

    fn file_size(&self, path: &str) -> Result<u64> {
        self.check_closed()?;

        let full = self.file_path(path)?;
        let metadata = full.metadata().map_err(|e| map_io_error(path, e))?;
        Ok(metadata.len())
    }

    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

/// A file input implementation.
#[derive(Debug)]
pub struct FileInput {
    reader: BufReader<File>,
    size: u64,
}

impl FileInput {
    fn new(file: File, buffer_size: usize) -> Result<Self> {
        let metadata = file
            .metadata()
            .map_err(|e| CorpusBayesError::storage(format!("Failed to get file metadata: {e}")))?;

        let size = metadata.len();
        let reader = BufReader::with_capacity(buffer_size, file);

        Ok(FileInput { reader, size })
    }
}

impl Read for FileInput {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.reader.read(buf)
    }
}

impl StorageInput for FileInput {
    fn size(&self) -> Result<u64> {
        Ok(self.size)
    }

    fn close(&mut self) -> Result<()> {
        // The file is closed when the reader is dropped.
        Ok(())
    }
}

/// A file output implementation.
#[derive(Debug)]
pub struct FileOutput {
    writer: BufWriter<File>,
    sync_writes: bool,
    position: u64,
}

impl FileOutput {
    fn new(file: File, buffer_size: usize, sync_writes: bool) -> Self {
        FileOutput {
            writer: BufWriter::with_capacity(buffer_size, file),
            sync_writes,
            position: 0,
        }
    }
}

impl Write for FileOutput {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let bytes_written = self.writer.write(buf)?;
        self.position += bytes_written as u64;

        if self.sync_writes {
            self.writer.flush()?;
        }

        Ok(bytes_written)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

impl StorageOutput for FileOutput {
    fn flush_and_sync(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| CorpusBayesError::storage(format!("Failed to flush: {e}")))?;

        self.writer
            .get_ref()
            .sync_all()
            .map_err(|e| CorpusBayesError::storage(format!("Failed to sync: {e}")))?;

        Ok(())
    }

    fn position(&self) -> Result<u64> {
        Ok(self.position)
    }

    fn close(&mut self) -> Result<()> {
        self.flush_and_sync()
    }
}
