// Buffered append backend: one append-mode stream plus a running byte counter.
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use tracing::{debug, warn};

use crate::core::backend::Backend;
use crate::core::fs::ensure_regular_file;

pub struct FileBackend {
    path: PathBuf,
    out: Option<CountingWriter>,
    limit: u64,
}

struct CountingWriter {
    out: BufWriter<File>,
    written: u64,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            out: None,
            limit: 0,
        }
    }

    fn output(&mut self) -> Option<&mut CountingWriter> {
        // An out-of-band deletion invalidates the open stream; recreate.
        if self.out.is_some() && !self.path.is_file() {
            self.close();
        }
        if self.out.is_none() && !self.open_output() {
            return None;
        }
        self.out.as_mut()
    }

    fn open_output(&mut self) -> bool {
        if !ensure_regular_file(&self.path) {
            return false;
        }
        let length = fs::metadata(&self.path).map(|meta| meta.len()).unwrap_or(0);
        match OpenOptions::new().append(true).open(&self.path) {
            Ok(file) => {
                self.out = Some(CountingWriter {
                    out: BufWriter::new(file),
                    written: length,
                });
                true
            }
            Err(err) => {
                warn!(path = %self.path.display(), %err, "failed to open append stream");
                false
            }
        }
    }

    fn enforce_limit(&mut self) {
        if self.limit > 0 && self.size() > self.limit {
            debug!(path = %self.path.display(), limit = self.limit, "limit exceeded, rotating");
            self.close();
            let _ = fs::remove_file(&self.path);
        }
    }
}

impl Backend for FileBackend {
    fn write(&mut self, data: &[u8]) -> bool {
        let result = self.output().map(|output| {
            output
                .out
                .write_all(data)
                .and_then(|()| output.out.flush())
                .map(|()| output.written += data.len() as u64)
        });
        let ok = match result {
            Some(Ok(())) => true,
            Some(Err(err)) => {
                warn!(path = %self.path.display(), %err, "append failed");
                self.close();
                false
            }
            None => false,
        };
        self.enforce_limit();
        ok
    }

    fn flush(&mut self) {
        if let Some(output) = self.out.as_mut() {
            if let Err(err) = output.out.flush() {
                warn!(path = %self.path.display(), %err, "flush failed");
            }
        }
    }

    fn size(&mut self) -> u64 {
        match &self.out {
            Some(output) => output.written,
            None => fs::metadata(&self.path).map(|meta| meta.len()).unwrap_or(0),
        }
    }

    fn set_limit(&mut self, limit: u64) {
        self.limit = limit;
        self.enforce_limit();
    }

    fn close(&mut self) {
        if let Some(mut output) = self.out.take() {
            if let Err(err) = output.out.flush() {
                warn!(path = %self.path.display(), %err, "flush on close failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::FileBackend;
    use crate::core::backend::Backend;

    #[test]
    fn appends_and_counts_from_existing_length() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.log");
        std::fs::write(&path, b"12345").expect("seed");

        let mut backend = FileBackend::new(&path);
        assert!(backend.write(b"67890"));
        assert_eq!(backend.size(), 10);
        assert_eq!(std::fs::read(&path).expect("read"), b"1234567890");
    }

    #[test]
    fn recreates_stream_after_external_deletion() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.log");

        let mut backend = FileBackend::new(&path);
        assert!(backend.write(b"first"));
        std::fs::remove_file(&path).expect("delete");
        assert!(backend.write(b"second"));
        assert_eq!(std::fs::read(&path).expect("read"), b"second");
    }

    #[test]
    fn limit_breach_deletes_the_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.log");

        let mut backend = FileBackend::new(&path);
        backend.set_limit(1000);
        assert!(backend.write(&[b'a'; 500]));
        assert!(backend.write(&[b'b'; 500]));
        assert!(path.is_file(), "1000 bytes does not breach a 1000 limit");
        assert!(backend.write(&[b'c'; 500]));
        assert!(!path.exists(), "breaching write rotates the log away");
        assert_eq!(backend.size(), 0);
    }

    #[test]
    fn size_without_stream_reads_on_disk_length() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("app.log");
        std::fs::write(&path, b"abcdef").expect("seed");
        assert_eq!(FileBackend::new(&path).size(), 6);
    }
}
