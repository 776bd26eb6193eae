// Fixed-layout header holding the recovery checkpoint for the mmap backend.
//
// Layout (host-native byte order, load-bearing across restarts):
//   [0, 8)  i64 remaining capacity of the last persisted window
//   [8, 32) reserved, zero

pub const HEADER_SIZE: usize = 32;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Header {
    pub remaining: i64,
}

impl Header {
    pub fn new(remaining: i64) -> Self {
        Self { remaining }
    }

    pub fn encode(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..8].copy_from_slice(&self.remaining.to_ne_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Self {
        let mut raw = [0u8; 8];
        if buf.len() >= 8 {
            raw.copy_from_slice(&buf[0..8]);
        }
        Self {
            remaining: i64::from_ne_bytes(raw),
        }
    }

    /// Checkpoint value clamped for use as a resume offset; garbage or
    /// never-written headers read as zero remaining.
    pub fn remaining_clamped(&self) -> u64 {
        self.remaining.max(0) as u64
    }
}
