// Core modules implementing storage backends, instance pooling, and error modeling.
pub mod backend;
pub mod bytesize;
pub mod error;
pub mod file;
pub mod fs;
pub mod header;
pub mod memory;
pub mod mmap;
pub mod registry;
