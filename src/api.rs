//! Purpose: Define the stable public writer surface over the storage core.
//! Exports: `Writer` and the backend factory (`open`, `open_in`).
//! Role: Per-call-site facade; forwards every operation to the shared
//! backend obtained from the registry and owns one reference-count unit.
//! Invariants: The facade holds no mutable state beyond its registry handle.
//! Invariants: Closing is idempotent; the last close for a path destroys the
//! shared backend.

use std::path::Path;
use std::sync::Arc;

use crate::core::backend::{Backend, BackendKind};
use crate::core::error::{Error, ErrorKind};
use crate::core::file::FileBackend;
use crate::core::memory::MemoryBackend;
use crate::core::mmap::MmapBackend;
use crate::core::registry::{Handle, Registry};

pub struct Writer {
    kind: BackendKind,
    handle: Option<Handle>,
}

impl Writer {
    /// Opens a writer on the process-wide registry.
    pub fn open(kind: BackendKind, path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::open_in(Registry::global(), kind, path)
    }

    /// Opens a writer on an explicit registry; tests pass a fresh one.
    pub fn open_in(
        registry: &Arc<Registry>,
        kind: BackendKind,
        path: impl AsRef<Path>,
    ) -> Result<Self, Error> {
        let path = path.as_ref();
        if path.is_dir() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("log path must not be a directory")
                .with_path(path));
        }
        let path = std::path::absolute(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to resolve absolute path")
                .with_path(path)
                .with_source(err)
        })?;
        let factory_path = path.clone();
        let handle = registry.acquire(kind, path, move || -> Box<dyn Backend> {
            match kind {
                BackendKind::Memory => Box::new(MemoryBackend::new()),
                BackendKind::File => Box::new(FileBackend::new(factory_path)),
                BackendKind::Mmap => Box::new(MmapBackend::new(factory_path)),
            }
        });
        Ok(Self {
            kind,
            handle: Some(handle),
        })
    }

    pub fn kind(&self) -> BackendKind {
        self.kind
    }

    /// Appends `data`; `false` means the backend hit an I/O failure and
    /// closed itself (a later call retries from scratch).
    pub fn write(&self, data: &[u8]) -> bool {
        match &self.handle {
            Some(handle) => handle.lock().write(data),
            None => false,
        }
    }

    pub fn flush(&self) {
        if let Some(handle) = &self.handle {
            handle.lock().flush();
        }
    }

    /// Cumulative bytes written to the log, reflecting on-disk state even
    /// before the first write in this process.
    pub fn size(&self) -> u64 {
        match &self.handle {
            Some(handle) => handle.lock().size(),
            None => 0,
        }
    }

    /// Soft size ceiling; 0 means unbounded. Exceeding it rotates the log
    /// (close and delete) so the next write starts fresh.
    pub fn set_limit(&self, limit: u64) {
        if let Some(handle) = &self.handle {
            handle.lock().set_limit(limit);
        }
    }

    /// Releases this facade's reference-count unit after a best-effort
    /// flush. Idempotent; dropping the writer has the same effect.
    pub fn close(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.lock().flush();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Writer;
    use crate::core::backend::BackendKind;
    use crate::core::registry::Registry;

    #[test]
    fn directory_path_is_a_usage_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = Registry::new();
        let err = Writer::open_in(&registry, BackendKind::Mmap, dir.path())
            .err()
            .expect("directory must be rejected");
        assert_eq!(err.kind(), crate::core::error::ErrorKind::Usage);
    }

    #[test]
    fn close_is_idempotent_and_releases_the_instance() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.log");
        let registry = Registry::new();

        let mut writer =
            Writer::open_in(&registry, BackendKind::Mmap, &path).expect("open writer");
        assert!(writer.write(b"hello"));
        assert_eq!(registry.instance_count(), 1);

        writer.close();
        writer.close();
        assert_eq!(registry.instance_count(), 0);
        assert!(!writer.write(b"after close"));
        assert_eq!(writer.size(), 0);
    }

    #[test]
    fn two_writers_on_one_path_share_one_instance() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.log");
        let registry = Registry::new();

        let first = Writer::open_in(&registry, BackendKind::File, &path).expect("open first");
        let second = Writer::open_in(&registry, BackendKind::File, &path).expect("open second");
        assert_eq!(registry.instance_count(), 1);

        assert!(first.write(b"one"));
        assert_eq!(second.size(), 3);
    }
}
