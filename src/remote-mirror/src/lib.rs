//! Remote memory access for out-of-process introspection
//!
//! A metadata walker reads the memory of another address space (a live
//! process, a core dump, a simulated target) through the [`MemoryReader`]
//! trait without knowing how that target is reached.
//!
//! # Backends
//!
//! - Native Rust backends implement [`MemoryReader`] directly.
//! - Backends compiled separately (a C plugin, another build unit) expose a
//!   flat [`MemoryReaderImpl`] function table, wrapped by [`CMemoryReader`].
//! - [`ExportedReader`] goes the other way, handing a native reader to C
//!   consumers as a [`MemoryReaderImpl`].
//!
//! # Buffer ownership
//!
//! Every successful [`MemoryReader::read_bytes`] returns a [`RemoteBytes`]:
//! a borrowed view plus the release action the backend asked for. The
//! release runs exactly once, when the value is dropped or passed to
//! [`RemoteBytes::release`].

mod address;
mod bytes;
mod ext;
pub mod ffi;
#[cfg(test)]
mod mock;
mod options;
mod reader;

pub use address::RemoteAddress;
pub use bytes::RemoteBytes;
pub use ext::MemoryReaderExt;
pub use ffi::{CMemoryReader, ExportedReader, FreeBytesFn, MemoryReaderImpl};
pub use options::ReaderOptions;
pub use reader::{MemoryReader, MAX_SCANNED_STRING, STRING_SCAN_CHUNK};

/// Errors from remote memory access
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("Missing required entry point: {0}")]
    MissingEntryPoint(&'static str),

    #[error("Invalid target pointer size: backend reported 0")]
    InvalidPointerSize,

    #[error("Failed to read {size} bytes at {address}")]
    ReadFailed { address: RemoteAddress, size: u64 },

    #[error("Read size {0} exceeds the host address space")]
    SizeOverflow(u64),

    #[error("Unsupported integer width: {0} bytes")]
    UnsupportedWidth(u8),

    #[error("Invalid reader options: {0}")]
    Config(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
