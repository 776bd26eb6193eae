// Volatile backend: a fixed buffer that clears and restarts on overflow.
use crate::core::backend::Backend;

const CAPACITY: usize = 1024 * 1024;

pub struct MemoryBackend {
    buf: Vec<u8>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            buf: Vec::with_capacity(CAPACITY),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl Backend for MemoryBackend {
    fn write(&mut self, data: &[u8]) -> bool {
        if data.len() > CAPACITY {
            return false;
        }
        if self.buf.len() + data.len() > CAPACITY {
            self.buf.clear();
        }
        self.buf.extend_from_slice(data);
        true
    }

    fn flush(&mut self) {}

    fn size(&mut self) -> u64 {
        self.buf.len() as u64
    }

    // Capacity is the bound; the rotation limit does not apply.
    fn set_limit(&mut self, _limit: u64) {}

    fn close(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::{CAPACITY, MemoryBackend};
    use crate::core::backend::Backend;

    #[test]
    fn size_tracks_appends() {
        let mut backend = MemoryBackend::new();
        assert!(backend.write(b"hello"));
        assert!(backend.write(b" world"));
        assert_eq!(backend.size(), 11);
    }

    #[test]
    fn overflow_clears_and_restarts() {
        let mut backend = MemoryBackend::new();
        let chunk = vec![1u8; CAPACITY - 10];
        assert!(backend.write(&chunk));
        assert!(backend.write(&[2u8; 100]));
        assert_eq!(backend.size(), 100);
    }

    #[test]
    fn oversized_append_is_rejected() {
        let mut backend = MemoryBackend::new();
        assert!(!backend.write(&vec![0u8; CAPACITY + 1]));
        assert_eq!(backend.size(), 0);
    }
}
