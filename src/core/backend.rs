// Backend contract shared by the memory, file, and mmap storage strategies.
use std::fmt;
use std::str::FromStr;

/// One concrete storage strategy behind the writer contract.
///
/// Implementations serialize nothing themselves; the registry wraps each
/// instance in a mutex and every call arrives with exclusive access.
pub trait Backend: Send {
    /// Appends `data`, reporting success. I/O failures are absorbed: the
    /// instance force-closes and the call returns `false`; a later call
    /// lazily reopens.
    fn write(&mut self, data: &[u8]) -> bool;

    /// Best-effort push to durable storage; failures are swallowed.
    fn flush(&mut self);

    /// Cumulative bytes written, lazily initializing from on-disk state
    /// when the instance is unopened.
    fn size(&mut self) -> u64;

    /// Sets the soft size ceiling; 0 means unbounded. Exceeding it after a
    /// write closes and deletes the log so the next write starts fresh.
    fn set_limit(&mut self, limit: u64);

    /// Idempotent: flushes best-effort and releases handles and mappings.
    fn close(&mut self);
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum BackendKind {
    Memory,
    File,
    Mmap,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Memory => "memory",
            BackendKind::File => "file",
            BackendKind::Mmap => "mmap",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "memory" => Ok(BackendKind::Memory),
            "file" => Ok(BackendKind::File),
            "mmap" => Ok(BackendKind::Mmap),
            other => Err(format!(
                "unknown backend kind '{other}' (expected memory, file, or mmap)"
            )),
        }
    }
}
