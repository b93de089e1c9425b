//! In-memory record file.
//!
//! Implements [`FileStore`] without a filesystem, for host simulation and
//! tests.  Writes can be made to fail, either cleanly or leaving half a
//! line behind, to exercise the store's failure paths.

use crate::app::ports::{FileStore, FsCapacity};
use crate::error::StoreError;

/// Simulated filesystem size reported through [`FileStore::capacity`].
const SIM_CAPACITY_BYTES: u64 = 1_441_792; // default 1.375 MB SPIFFS partition

#[derive(Debug, Clone)]
pub struct MemFileStore {
    content: Option<String>,
    writable: bool,
    torn_appends: bool,
}

impl Default for MemFileStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemFileStore {
    /// A backend with no file.
    pub fn new() -> Self {
        Self {
            content: None,
            writable: true,
            torn_appends: false,
        }
    }

    /// A backend whose file already holds `content`.
    pub fn with_content(content: &str) -> Self {
        Self {
            content: Some(content.to_owned()),
            writable: true,
            torn_appends: false,
        }
    }

    /// When `false`, `create` and `append` fail with `OpenFailed`.
    pub fn set_writable(&mut self, writable: bool) {
        self.writable = writable;
    }

    /// When `true`, `append` writes the first half of the line and then
    /// fails with `WriteFailed`, like a write cut short by power loss.
    pub fn set_torn_appends(&mut self, torn: bool) {
        self.torn_appends = torn;
    }

    pub fn content(&self) -> Option<&str> {
        self.content.as_deref()
    }
}

impl FileStore for MemFileStore {
    fn exists(&self) -> bool {
        self.content.is_some()
    }

    fn create(&mut self, contents: &str) -> Result<(), StoreError> {
        if !self.writable {
            return Err(StoreError::OpenFailed);
        }
        self.content = Some(contents.to_owned());
        Ok(())
    }

    fn append(&mut self, line: &str) -> Result<(), StoreError> {
        if !self.writable {
            return Err(StoreError::OpenFailed);
        }
        match self.content.as_mut() {
            Some(c) if self.torn_appends => {
                c.extend(line.chars().take(line.chars().count() / 2));
                Err(StoreError::WriteFailed)
            }
            Some(c) => {
                c.push_str(line);
                Ok(())
            }
            None => Err(StoreError::OpenFailed),
        }
    }

    fn read_to_string(&self) -> Result<String, StoreError> {
        self.content.clone().ok_or(StoreError::Missing)
    }

    fn remove(&mut self) -> Result<(), StoreError> {
        self.content = None;
        Ok(())
    }

    fn size(&self) -> u64 {
        self.content.as_ref().map_or(0, |c| c.len() as u64)
    }

    fn capacity(&self) -> Option<FsCapacity> {
        Some(FsCapacity {
            total_bytes: SIM_CAPACITY_BYTES,
            used_bytes: self.size(),
        })
    }
}
