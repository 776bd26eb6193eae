//! Purpose: Memory-mapped append backend with crash-recoverable resume.
//! Exports: `MmapBackend`, `default_marker`.
//! Role: The core storage strategy; batches appends through mapped windows
//! that tile the file, and checkpoints the active window's remaining
//! capacity into a fixed header so a restart resumes without scanning.
//! Invariants: The header window is mapped once per instance lifetime.
//! Invariants: The checkpoint is persisted before any write reports success.
//! Invariants: Windows start at `max(HEADER_SIZE, file_len - remaining)`, so
//! consecutive windows leave no gap and no overlap in the data region.

use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;

use memmap2::{MmapMut, MmapOptions};
use tracing::{debug, warn};

use crate::core::backend::Backend;
use crate::core::fs::ensure_regular_file;
use crate::core::header::{HEADER_SIZE, Header};

const CHUNK_SIZE: u64 = 512 * 1024;

/// Marker bytes written at the start of a brand-new log, so tailing tools
/// treat the data region as beginning on a fresh line. Compatibility only;
/// override with [`MmapBackend::with_marker`].
pub fn default_marker() -> &'static [u8] {
    if cfg!(windows) { b"\r\n" } else { b"\n" }
}

struct Window {
    map: MmapMut,
    pos: usize,
}

impl Window {
    fn remaining(&self) -> usize {
        self.map.len() - self.pos
    }
}

pub struct MmapBackend {
    path: PathBuf,
    marker: Vec<u8>,
    file: Option<File>,
    header: Option<MmapMut>,
    window: Option<Window>,
    /// Cumulative data bytes (marker included, header excluded); `None`
    /// until lazily seeded from on-disk state.
    size: Option<u64>,
    limit: u64,
}

impl MmapBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            marker: default_marker().to_vec(),
            file: None,
            header: None,
            window: None,
            size: None,
            limit: 0,
        }
    }

    pub fn with_marker(mut self, marker: impl Into<Vec<u8>>) -> Self {
        self.marker = marker.into();
        self
    }

    /// Opens the file (creating it via the fs helper) and maps the header
    /// window. Both survive data-window turnover.
    fn open_file(&mut self) -> Option<()> {
        if self.file.is_none() {
            if !ensure_regular_file(&self.path) {
                return None;
            }
            let file = match OpenOptions::new().read(true).write(true).open(&self.path) {
                Ok(file) => file,
                Err(err) => {
                    warn!(path = %self.path.display(), %err, "failed to open log file");
                    return None;
                }
            };
            let length = match file.metadata() {
                Ok(meta) => meta.len(),
                Err(err) => {
                    warn!(path = %self.path.display(), %err, "failed to stat log file");
                    return None;
                }
            };
            if length < HEADER_SIZE as u64 {
                if let Err(err) = file.set_len(HEADER_SIZE as u64) {
                    warn!(path = %self.path.display(), %err, "failed to reserve header");
                    return None;
                }
            }
            self.file = Some(file);
        }
        if self.header.is_none() {
            let file = self.file.as_ref()?;
            let map = unsafe { MmapOptions::new().len(HEADER_SIZE).map_mut(file) };
            match map {
                Ok(map) => self.header = Some(map),
                Err(err) => {
                    warn!(path = %self.path.display(), %err, "failed to map header window");
                    self.close();
                    return None;
                }
            }
        }
        Some(())
    }

    fn read_checkpoint(&mut self) -> Option<u64> {
        self.open_file()?;
        let header = self.header.as_ref()?;
        Some(Header::decode(header).remaining_clamped())
    }

    fn persist_remaining(&mut self, remaining: i64) {
        if let Some(header) = self.header.as_mut() {
            header.copy_from_slice(&Header::new(remaining).encode());
        }
    }

    /// Guarantees an active window with at least `need` bytes remaining.
    fn ensure_window(&mut self, need: usize) -> bool {
        if let Some(window) = self.window.as_ref() {
            if window.remaining() >= need {
                return true;
            }
            let remaining = window.remaining() as u64;
            debug!(
                remaining,
                exists = self.path.is_file(),
                path = %self.path.display(),
                "window exhausted"
            );
            if self.path.is_file() {
                // File and header stay open; only the data window turns over.
                self.window = None;
            } else {
                self.close();
            }
            return self.create_window(remaining, need);
        }
        match self.read_checkpoint() {
            Some(remaining) => self.create_window(remaining, need),
            None => false,
        }
    }

    /// Maps the next window, tiling the data region from where the previous
    /// window's unused tail began.
    fn create_window(&mut self, remaining: u64, need: usize) -> bool {
        if self.open_file().is_none() {
            return false;
        }
        let Some(file) = self.file.as_ref() else {
            return false;
        };
        let length = match file.metadata() {
            Ok(meta) => meta.len(),
            Err(err) => {
                warn!(path = %self.path.display(), %err, "failed to stat log file");
                self.close();
                return false;
            }
        };
        let position = length.saturating_sub(remaining).max(HEADER_SIZE as u64);
        // A window opening a fresh data region leads with the marker, which
        // must not crowd out the append that forced the window.
        let needed = if position == HEADER_SIZE as u64 {
            (self.marker.len() + need) as u64
        } else {
            need as u64
        };
        let capacity = needed.max(CHUNK_SIZE);
        // Mapping past EOF does not extend the file; reserve the full
        // window up front.
        if let Err(err) = file.set_len(position + capacity) {
            warn!(path = %self.path.display(), %err, "failed to extend log file");
            self.close();
            return false;
        }
        let map = unsafe {
            MmapOptions::new()
                .offset(position)
                .len(capacity as usize)
                .map_mut(file)
        };
        let map = match map {
            Ok(map) => map,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "failed to map data window");
                self.close();
                return false;
            }
        };
        debug!(position, capacity, path = %self.path.display(), "mapped window");
        self.window = Some(Window { map, pos: 0 });
        if self.size.is_none() {
            self.size = Some(position - HEADER_SIZE as u64);
        }
        if position == HEADER_SIZE as u64 {
            // Brand-new data region: lead with the marker record.
            let marker = self.marker.clone();
            self.append(&marker)
        } else {
            self.persist_remaining(capacity as i64);
            true
        }
    }

    fn append(&mut self, data: &[u8]) -> bool {
        let Some(window) = self.window.as_mut() else {
            return false;
        };
        let end = window.pos + data.len();
        if end > window.map.len() {
            warn!(path = %self.path.display(), "append exceeds window capacity");
            self.close();
            return false;
        }
        window.map[window.pos..end].copy_from_slice(data);
        window.pos = end;
        let remaining = window.remaining() as i64;
        self.size = Some(self.size.unwrap_or(0) + data.len() as u64);
        self.persist_remaining(remaining);
        true
    }

    fn enforce_limit(&mut self) {
        if self.limit > 0 && self.size() > self.limit {
            debug!(path = %self.path.display(), limit = self.limit, "limit exceeded, rotating");
            self.close();
            let _ = fs::remove_file(&self.path);
        }
    }
}

impl Backend for MmapBackend {
    fn write(&mut self, data: &[u8]) -> bool {
        let ok = self.ensure_window(data.len()) && self.append(data);
        self.enforce_limit();
        ok
    }

    fn flush(&mut self) {
        if let Some(window) = &self.window {
            if let Err(err) = window.map.flush() {
                warn!(path = %self.path.display(), %err, "window flush failed");
            }
        }
        if let Some(header) = &self.header {
            if let Err(err) = header.flush() {
                warn!(path = %self.path.display(), %err, "header flush failed");
            }
        }
    }

    fn size(&mut self) -> u64 {
        // Size must reflect on-disk truth even before the first write in
        // this process, so an unopened instance initializes here.
        self.ensure_window(0);
        self.size.unwrap_or(0)
    }

    fn set_limit(&mut self, limit: u64) {
        self.limit = limit;
        self.enforce_limit();
    }

    fn close(&mut self) {
        if self.file.is_some() {
            debug!(path = %self.path.display(), "close");
        }
        self.flush();
        self.window = None;
        self.header = None;
        self.file = None;
        self.size = None;
    }
}

impl Drop for MmapBackend {
    fn drop(&mut self) {
        self.close();
    }
}
