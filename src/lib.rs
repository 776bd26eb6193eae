//! Purpose: Shared core library crate used by the `seqlog` demo binary and tests.
//! Exports: `core` (backends, registry, header, errors) and `api` (writer facade).
//! Role: Internal library backing the binary; not yet a stable public SDK.
//! Invariants: Treat the crate API as internal until a dedicated library release.
//! Invariants: All file mutation goes through a registry-shared backend instance.
pub mod api;
pub mod core;

pub use crate::api::Writer;
pub use crate::core::backend::BackendKind;
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::registry::Registry;
