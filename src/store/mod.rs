//! Append-only CSV record store.
//!
//! One header line followed by one line per record, in sequence order:
//!
//! ```text
//! Timestamp,DateTime,Temperature_C,Temperature_F,Humidity_Percent,Motion_Detected,Data_Point
//! 1754913600,2025-08-11 12:00:00,23.50,74.30,41.20,false,42
//! ```
//!
//! The store owns the sequence counter.  The counter always equals the
//! number of data lines successfully persisted: it advances only after a
//! completed append, is recovered from the file at open, and drops to 0
//! whenever the file is recreated.
//!
//! A file that is not exactly "header, then complete records" (empty,
//! headerless, or ending in a torn write) is rewritten at open: the
//! header first, then every complete record in its original order.

pub mod projector;

use chrono::{DateTime, FixedOffset};
use log::{error, info, warn};

use crate::app::ports::{FileStore, FsCapacity};
use crate::error::StoreError;
use crate::sensors::climate::{Reading, celsius_to_fahrenheit};

/// Fixed schema line.  Must be the first line of the file.
pub const HEADER: &str =
    "Timestamp,DateTime,Temperature_C,Temperature_F,Humidity_Percent,Motion_Detected,Data_Point";

/// Columns per line.
pub const FIELD_COUNT: usize = 7;

/// `chrono` format of the `DateTime` column.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A persisted record.  Immutable once appended.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub sequence: u32,
    /// UTC epoch seconds.
    pub epoch_timestamp: i64,
    /// Local time, `YYYY-MM-DD HH:MM:SS`.
    pub local_datetime: String,
    pub temperature_c: f32,
    pub humidity_pct: f32,
    pub motion_detected: bool,
}

impl Record {
    pub fn temperature_f(&self) -> f32 {
        celsius_to_fahrenheit(self.temperature_c)
    }

    /// The line written to the store, newline included.
    pub fn to_csv_line(&self) -> String {
        format!(
            "{},{},{:.2},{:.2},{:.2},{},{}\n",
            self.epoch_timestamp,
            self.local_datetime,
            self.temperature_c,
            self.temperature_f(),
            self.humidity_pct,
            self.motion_detected,
            self.sequence,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoreStats {
    pub record_count: u32,
    pub byte_size: u64,
}

pub struct RecordStore<F: FileStore> {
    file: F,
    last_sequence: u32,
    /// Set when a write may have left the file malformed.
    needs_repair: bool,
}

impl<F: FileStore> RecordStore<F> {
    /// Open the store at startup: ensure the header exists and recover
    /// the sequence counter from the records already on disk.
    pub fn open(file: F) -> Self {
        let mut store = Self {
            file,
            last_sequence: 0,
            needs_repair: false,
        };
        if let Err(e) = store.ensure_header() {
            error!("Store: could not prepare record file: {}", e);
            store.needs_repair = true;
        }
        store.last_sequence = store.recover_count();
        info!("Store: opened with {} records", store.last_sequence);
        store
    }

    /// Make the file start with the header and hold only complete
    /// records.
    ///
    /// A missing or empty file gets just the header.  A malformed one is
    /// rewritten, keeping its complete records.  A well-formed file is
    /// left untouched.
    pub fn ensure_header(&mut self) -> Result<(), StoreError> {
        if !self.file.exists() {
            self.file.create(&header_line())?;
            info!("Store: created record file with header");
            return Ok(());
        }
        let content = self.file.read_to_string()?;
        if is_well_formed(&content) {
            return Ok(());
        }
        let (repaired, dropped) = repair(&content);
        self.file.create(&repaired)?;
        if content.trim().is_empty() {
            info!("Store: record file was empty, wrote header");
        } else {
            warn!("Store: rewrote malformed record file, dropped {} lines", dropped);
        }
        Ok(())
    }

    /// Persist one record and return it.
    ///
    /// On failure the counter is unchanged.  A partial line left by a
    /// failed write is removed before the next append or export.
    pub fn append(
        &mut self,
        reading: &Reading,
        motion: bool,
        now: &DateTime<FixedOffset>,
    ) -> Result<Record, StoreError> {
        self.repair_if_needed()?;

        let record = Record {
            sequence: self.last_sequence + 1,
            epoch_timestamp: now.timestamp(),
            local_datetime: now.format(DATETIME_FORMAT).to_string(),
            temperature_c: reading.temperature_c,
            humidity_pct: reading.humidity_pct,
            motion_detected: motion,
        };

        if let Err(e) = self.file.append(&record.to_csv_line()) {
            error!("Store: append of record {} failed: {}", record.sequence, e);
            // A partial line may be on disk; clean it up before the next one.
            self.needs_repair = e == StoreError::WriteFailed;
            return Err(e);
        }
        self.last_sequence = record.sequence;
        Ok(record)
    }

    /// Delete every record and restart the sequence.  No undo.
    pub fn reset(&mut self) -> Result<(), StoreError> {
        self.file.remove()?;
        self.last_sequence = 0;
        self.needs_repair = false;
        self.ensure_header()?;
        info!("Store: cleared");
        Ok(())
    }

    /// Raw file content, header included.  A missing file is recreated
    /// (and a torn write cleaned up) first, so the result always starts
    /// with the header.
    pub fn read_all(&mut self) -> Result<String, StoreError> {
        self.repair_if_needed()?;
        self.file.read_to_string()
    }

    pub fn stats(&self) -> StoreStats {
        StoreStats {
            record_count: self.last_sequence,
            byte_size: self.file.size(),
        }
    }

    pub fn last_sequence(&self) -> u32 {
        self.last_sequence
    }

    pub fn capacity(&self) -> Option<FsCapacity> {
        self.file.capacity()
    }

    pub fn backend(&self) -> &F {
        &self.file
    }

    pub fn backend_mut(&mut self) -> &mut F {
        &mut self.file
    }

    /// Recreate a missing file, or clean up after a failed write, and
    /// recount.
    fn repair_if_needed(&mut self) -> Result<(), StoreError> {
        if !self.file.exists() {
            warn!("Store: record file missing, recreating");
            self.needs_repair = true;
        }
        if !self.needs_repair {
            return Ok(());
        }
        self.ensure_header().inspect_err(|e| {
            error!("Store: repair failed: {}", e);
        })?;
        self.last_sequence = self.recover_count();
        self.needs_repair = false;
        Ok(())
    }

    /// Count complete records.  The header and fragments do not count.
    fn recover_count(&self) -> u32 {
        match self.file.read_to_string() {
            Ok(content) => content.lines().filter(|l| is_record_line(l)).count() as u32,
            Err(e) => {
                warn!("Store: could not read back record file: {}", e);
                0
            }
        }
    }
}

fn header_line() -> String {
    format!("{HEADER}\n")
}

/// Seven fields with a numeric timestamp and sequence number.
fn is_record_line(line: &str) -> bool {
    let fields: Vec<&str> = line.split(',').collect();
    fields.len() == FIELD_COUNT
        && fields[0].parse::<i64>().is_ok()
        && fields[FIELD_COUNT - 1].parse::<u32>().is_ok()
}

/// Header line, then only complete records, newline-terminated.
fn is_well_formed(content: &str) -> bool {
    let mut lines = content.lines();
    content.ends_with('\n') && lines.next() == Some(HEADER) && lines.all(is_record_line)
}

/// Rebuild `content` as header plus its complete records.  Also returns
/// how many non-blank lines were discarded.
fn repair(content: &str) -> (String, usize) {
    // Text after the last newline is a torn write.
    let terminated = content.rfind('\n').map_or("", |i| &content[..=i]);
    let mut dropped = usize::from(!content[terminated.len()..].trim().is_empty());
    let mut out = header_line();
    for line in terminated.lines() {
        if is_record_line(line) {
            out.push_str(line);
            out.push('\n');
        } else if line != HEADER && !line.trim().is_empty() {
            dropped += 1;
        }
    }
    (out, dropped)
}
