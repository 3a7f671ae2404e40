//! C interface for memory reader backends
//!
//! A backend built separately (a plugin, another language) describes itself
//! with a [`MemoryReaderImpl`]: one opaque context pointer plus a table of
//! `extern "C"` entry points. Every entry point receives the context
//! unchanged as its first argument.
//!
//! # Buffer release convention
//!
//! `read_bytes` returns a pointer to the bytes and fills two out-parameters:
//! a [`FreeBytesFn`] and a context for it. The consumer calls
//! `free(bytes, free_context)` exactly once when it is done with the bytes.
//! A null return means the read failed; nothing is freed in that case. A null
//! `free` means the backend keeps the memory alive itself.

use std::ffi::{c_char, c_void};

mod adapter;
mod export;

pub use adapter::CMemoryReader;
pub use export::ExportedReader;

/// Releases a buffer returned by [`ReadBytesFn`]
pub type FreeBytesFn = unsafe extern "C" fn(bytes: *const c_void, context: *mut c_void);

/// Width of a target pointer in bytes
pub type PointerSizeFn = unsafe extern "C" fn(reader_context: *mut c_void) -> u8;

/// Width of the target's size type in bytes
pub type SizeSizeFn = unsafe extern "C" fn(reader_context: *mut c_void) -> u8;

/// Read `size` bytes at `address`; null on failure
pub type ReadBytesFn = unsafe extern "C" fn(
    reader_context: *mut c_void,
    address: u64,
    size: u64,
    out_free_bytes: *mut Option<FreeBytesFn>,
    out_free_context: *mut *mut c_void,
) -> *const c_void;

/// Length of the string at `address`; zero when there is none
pub type StringLengthFn = unsafe extern "C" fn(reader_context: *mut c_void, address: u64) -> u64;

/// Address of a symbol; zero when unknown. `name` is not NUL-terminated.
pub type SymbolAddressFn =
    unsafe extern "C" fn(reader_context: *mut c_void, name: *const c_char, name_length: u64) -> u64;

/// Entry-point table supplied by a foreign backend
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct MemoryReaderImpl {
    /// Opaque backend state, passed to every entry point
    pub reader_context: *mut c_void,
    pub get_pointer_size: Option<PointerSizeFn>,
    pub get_size_size: Option<SizeSizeFn>,
    pub read_bytes: Option<ReadBytesFn>,
    pub get_string_length: Option<StringLengthFn>,
    pub get_symbol_address: Option<SymbolAddressFn>,
}

impl Default for MemoryReaderImpl {
    fn default() -> Self {
        Self {
            reader_context: std::ptr::null_mut(),
            get_pointer_size: None,
            get_size_size: None,
            read_bytes: None,
            get_string_length: None,
            get_symbol_address: None,
        }
    }
}
