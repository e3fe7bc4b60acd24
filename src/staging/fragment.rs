//! A single staged cache fragment

use crate::config::{StagingBackend, StagingConfig};
use crate::error::{PlugcacheError, PlugcacheResult};
use crate::staging::exit_guard;
use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};

enum Storage {
    Disk(NamedTempFile),
    Memory(Vec<u8>),
}

/// Private copy of one archive entry's bytes
///
/// The source stream is only readable while the host visits the entry, so
/// its bytes are copied out at ingestion. Disk-backed fragments delete their
/// file when dropped.
pub struct StagedFragment {
    index: usize,
    len: u64,
    storage: Storage,
}

impl StagedFragment {
    /// Copy `input` into new staging storage
    pub fn stage(
        index: usize,
        input: &mut dyn Read,
        config: &StagingConfig,
    ) -> PlugcacheResult<Self> {
        let storage = match config.backend {
            StagingBackend::Disk => Storage::Disk(create_file(config)?),
            StagingBackend::Memory => Storage::Memory(Vec::new()),
        };
        // Constructed before copying so a failed copy still cleans up
        let mut fragment = Self {
            index,
            len: 0,
            storage,
        };

        fragment.len = match &mut fragment.storage {
            Storage::Disk(file) => {
                let path = file.path().display().to_string();
                let copied = io::copy(input, file.as_file_mut())
                    .and_then(|n| file.as_file_mut().flush().map(|()| n))
                    .map_err(|e| PlugcacheError::staging(format!("copying entry to {}", path), e))?;
                debug!(
                    "Staged fragment #{} in {} ({})",
                    index,
                    path,
                    super::format_bytes(copied)
                );
                copied
            }
            Storage::Memory(buf) => {
                let copied = input
                    .read_to_end(buf)
                    .map_err(|e| PlugcacheError::staging("reading entry into memory", e))?;
                debug!(
                    "Staged fragment #{} in memory ({})",
                    index,
                    super::format_bytes(copied as u64)
                );
                copied as u64
            }
        };

        Ok(fragment)
    }

    /// Position in staging order
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of staged bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Backing file, for disk-staged fragments
    pub fn path(&self) -> Option<&Path> {
        match &self.storage {
            Storage::Disk(file) => Some(file.path()),
            Storage::Memory(_) => None,
        }
    }

    /// Read the staged bytes back
    pub fn read(&self) -> PlugcacheResult<Vec<u8>> {
        match &self.storage {
            Storage::Disk(file) => fs::read(file.path()).map_err(|e| {
                PlugcacheError::staging(format!("reading back {}", file.path().display()), e)
            }),
            Storage::Memory(buf) => Ok(buf.clone()),
        }
    }
}

impl Drop for StagedFragment {
    fn drop(&mut self) {
        let storage = std::mem::replace(&mut self.storage, Storage::Memory(Vec::new()));
        if let Storage::Disk(file) = storage {
            let path = file.path().to_path_buf();
            match file.close() {
                Ok(()) => {
                    exit_guard::unregister(&path);
                    debug!("Removed staged fragment #{} ({})", self.index, path.display());
                }
                Err(e) => warn!(
                    "Failed to remove staged fragment {}, retrying at exit: {}",
                    path.display(),
                    e
                ),
            }
        }
    }
}

fn create_file(config: &StagingConfig) -> PlugcacheResult<NamedTempFile> {
    let mut builder = tempfile::Builder::new();
    builder.prefix(&config.prefix).suffix(&config.suffix);

    let file = match &config.dir {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| {
                PlugcacheError::staging(format!("creating staging directory {}", dir.display()), e)
            })?;
            builder.tempfile_in(dir)
        }
        None => builder.tempfile(),
    }
    .map_err(|e| PlugcacheError::staging("creating temporary file", e))?;

    exit_guard::register(file.path());
    debug!("Created temporary file {}", file.path().display());
    Ok(file)
}
