//! Filesystem-backed record file.
//!
//! Implements [`FileStore`] with `std::fs`.  On the ESP32 the path lives
//! on the SPIFFS partition mounted by
//! [`hw_init::mount_storage`](crate::drivers::hw_init::mount_storage);
//! on the host it is any writable path.
//!
//! Each append opens the file in append mode, writes the whole line with
//! a single `write_all`, and closes it again, so a power cut loses at
//! most the line being written.  A write that fails part-way is cut back
//! to the previous file length.

use std::fs::{self, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::warn;

use crate::app::ports::{FileStore, FsCapacity};
use crate::error::StoreError;

pub struct FsFileStore {
    path: PathBuf,
}

impl FsFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl FileStore for FsFileStore {
    fn exists(&self) -> bool {
        self.path.is_file()
    }

    fn create(&mut self, contents: &str) -> Result<(), StoreError> {
        fs::write(&self.path, contents).map_err(|e| {
            warn!("FsFileStore: create {} failed: {}", self.path.display(), e);
            StoreError::OpenFailed
        })
    }

    fn append(&mut self, line: &str) -> Result<(), StoreError> {
        let mut file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .map_err(|e| {
                warn!("FsFileStore: open {} failed: {}", self.path.display(), e);
                StoreError::OpenFailed
            })?;
        let start_len = file.metadata().map(|m| m.len()).ok();
        write_line(&mut file, line, |f| {
            let Some(len) = start_len else { return };
            if let Err(e) = f.set_len(len) {
                warn!("FsFileStore: truncate {} failed: {}", self.path.display(), e);
            }
        })
    }

    fn read_to_string(&self) -> Result<String, StoreError> {
        fs::read_to_string(&self.path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StoreError::Missing,
            _ => StoreError::ReadFailed,
        })
    }

    fn remove(&mut self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!("FsFileStore: remove {} failed: {}", self.path.display(), e);
                Err(StoreError::RemoveFailed)
            }
        }
    }

    fn size(&self) -> u64 {
        fs::metadata(&self.path).map_or(0, |m| m.len())
    }

    #[cfg(target_os = "espidf")]
    fn capacity(&self) -> Option<FsCapacity> {
        crate::drivers::hw_init::storage_capacity()
    }

    #[cfg(not(target_os = "espidf"))]
    fn capacity(&self) -> Option<FsCapacity> {
        None
    }
}

/// Write and flush `line`.  On error, `rollback` runs before the
/// failure is reported.
fn write_line<W: Write>(
    out: &mut W,
    line: &str,
    rollback: impl FnOnce(&mut W),
) -> Result<(), StoreError> {
    let result: io::Result<()> = out.write_all(line.as_bytes()).and_then(|()| out.flush());
    result.map_err(|e| {
        warn!("FsFileStore: write failed: {}", e);
        rollback(out);
        StoreError::WriteFailed
    })
}
