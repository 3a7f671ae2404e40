//! Exporting native readers over the C interface
//!
//! Builds a [`MemoryReaderImpl`] whose entry points call back into a Rust
//! [`MemoryReader`], for consumers that only speak the C table.

use super::{FreeBytesFn, MemoryReaderImpl};
use crate::{MemoryReader, RemoteAddress};
use std::ffi::{c_char, c_void};
use std::{ptr, slice, str};
use tracing::{debug, trace};

/// A native reader lent out through a [`MemoryReaderImpl`].
///
/// The table returned by [`ExportedReader::as_impl`] points at the borrowed
/// reader and must not be used after the `ExportedReader` is gone.
pub struct ExportedReader<'a, R: MemoryReader> {
    reader: &'a R,
}

impl<'a, R: MemoryReader> ExportedReader<'a, R> {
    pub fn new(reader: &'a R) -> Self {
        Self { reader }
    }

    pub fn reader(&self) -> &'a R {
        self.reader
    }

    /// Entry-point table forwarding to the borrowed reader.
    ///
    /// Buffers handed out by `read_bytes` are copies owned by the table's
    /// release callback, so the native buffer is released before the call
    /// returns.
    pub fn as_impl(&self) -> MemoryReaderImpl {
        debug!(reader = std::any::type_name::<R>(), "exporting memory reader table");
        MemoryReaderImpl {
            reader_context: (self.reader as *const R).cast_mut().cast(),
            get_pointer_size: Some(export_pointer_size::<R>),
            get_size_size: Some(export_size_size::<R>),
            read_bytes: Some(export_read_bytes::<R>),
            get_string_length: Some(export_string_length::<R>),
            get_symbol_address: Some(export_symbol_address::<R>),
        }
    }
}

unsafe fn reader<'a, R: MemoryReader>(context: *mut c_void) -> &'a R {
    &*context.cast::<R>()
}

unsafe extern "C" fn export_pointer_size<R: MemoryReader>(context: *mut c_void) -> u8 {
    reader::<R>(context).pointer_size()
}

unsafe extern "C" fn export_size_size<R: MemoryReader>(context: *mut c_void) -> u8 {
    reader::<R>(context).size_size()
}

unsafe extern "C" fn export_symbol_address<R: MemoryReader>(
    context: *mut c_void,
    name: *const c_char,
    name_length: u64,
) -> u64 {
    if name.is_null() {
        return 0;
    }
    let Ok(name_length) = usize::try_from(name_length) else {
        return 0;
    };

    let name = slice::from_raw_parts(name.cast::<u8>(), name_length);
    match str::from_utf8(name) {
        Ok(name) => reader::<R>(context).symbol_address(name).address_data(),
        Err(_) => {
            trace!("symbol name is not valid UTF-8");
            0
        }
    }
}

unsafe extern "C" fn export_string_length<R: MemoryReader>(
    context: *mut c_void,
    address: u64,
) -> u64 {
    reader::<R>(context).string_length(RemoteAddress::new(address))
}

unsafe extern "C" fn export_read_bytes<R: MemoryReader>(
    context: *mut c_void,
    address: u64,
    size: u64,
    out_free_bytes: *mut Option<FreeBytesFn>,
    out_free_context: *mut *mut c_void,
) -> *const c_void {
    let address = RemoteAddress::new(address);
    let copy: Box<[u8]> = match reader::<R>(context).read_bytes(address, size) {
        Ok(bytes) => bytes.into_vec().into_boxed_slice(),
        Err(err) => {
            trace!(%address, size, %err, "exported read failed");
            return ptr::null();
        }
    };

    let bytes = copy.as_ptr();
    // The slice is fat, so the release context carries a thin box around it
    let owner = Box::into_raw(Box::new(copy));
    *out_free_bytes = Some(free_copied_bytes);
    *out_free_context = owner.cast();
    bytes.cast()
}

unsafe extern "C" fn free_copied_bytes(_bytes: *const c_void, context: *mut c_void) {
    drop(Box::from_raw(context.cast::<Box<[u8]>>()));
}
