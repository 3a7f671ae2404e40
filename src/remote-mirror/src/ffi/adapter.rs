//! Foreign Backend Adapter
//!
//! [`MemoryReader`] implementation that forwards every call through a
//! [`MemoryReaderImpl`] table.

use super::{
    FreeBytesFn, MemoryReaderImpl, PointerSizeFn, ReadBytesFn, SizeSizeFn, StringLengthFn,
    SymbolAddressFn,
};
use crate::{Error, MemoryReader, ReaderOptions, RemoteAddress, RemoteBytes, Result};
use std::ffi::{c_char, c_void};
use std::ptr::{self, NonNull};
use tracing::{debug, trace, warn};

/// Entry points of a table that passed validation
#[derive(Debug, Clone, Copy)]
struct EntryPoints {
    get_pointer_size: PointerSizeFn,
    get_size_size: SizeSizeFn,
    read_bytes: ReadBytesFn,
    get_string_length: StringLengthFn,
    get_symbol_address: SymbolAddressFn,
}

impl EntryPoints {
    fn from_table(table: &MemoryReaderImpl) -> Result<Self> {
        Ok(Self {
            get_pointer_size: require(table.get_pointer_size, "get_pointer_size")?,
            get_size_size: require(table.get_size_size, "get_size_size")?,
            read_bytes: require(table.read_bytes, "read_bytes")?,
            get_string_length: require(table.get_string_length, "get_string_length")?,
            get_symbol_address: require(table.get_symbol_address, "get_symbol_address")?,
        })
    }
}

fn require<T>(slot: Option<T>, name: &'static str) -> Result<T> {
    slot.ok_or_else(|| {
        warn!(entry_point = name, "memory reader table is missing an entry point");
        Error::MissingEntryPoint(name)
    })
}

/// A [`MemoryReader`] backed by a C function table.
///
/// Holds raw pointers into the backend, so it is neither `Send` nor `Sync`.
#[derive(Debug)]
pub struct CMemoryReader {
    context: *mut c_void,
    entry: EntryPoints,
    options: ReaderOptions,
}

impl CMemoryReader {
    /// Wrap a backend table with default options.
    ///
    /// # Safety
    ///
    /// Every entry point must follow the contract documented in
    /// [`crate::ffi`], and `table.reader_context` must stay valid for those
    /// entry points for as long as the returned reader (and any buffer read
    /// through it) is alive.
    pub unsafe fn new(table: MemoryReaderImpl) -> Result<Self> {
        Self::with_options(table, ReaderOptions::default())
    }

    /// Wrap a backend table.
    ///
    /// Fails if any entry point is null or the backend reports a pointer
    /// size of zero.
    ///
    /// # Safety
    ///
    /// Same requirements as [`CMemoryReader::new`].
    pub unsafe fn with_options(table: MemoryReaderImpl, options: ReaderOptions) -> Result<Self> {
        let entry = EntryPoints::from_table(&table)?;

        let pointer_size = (entry.get_pointer_size)(table.reader_context);
        if pointer_size == 0 {
            warn!("memory reader backend reported a pointer size of 0");
            return Err(Error::InvalidPointerSize);
        }

        debug!(pointer_size, ?options, "attached C memory reader");
        Ok(Self {
            context: table.reader_context,
            entry,
            options,
        })
    }

    pub fn options(&self) -> &ReaderOptions {
        &self.options
    }
}

impl MemoryReader for CMemoryReader {
    fn pointer_size(&self) -> u8 {
        unsafe { (self.entry.get_pointer_size)(self.context) }
    }

    fn size_size(&self) -> u8 {
        unsafe { (self.entry.get_size_size)(self.context) }
    }

    fn symbol_address(&self, name: &str) -> RemoteAddress {
        let address = unsafe {
            (self.entry.get_symbol_address)(
                self.context,
                name.as_ptr().cast::<c_char>(),
                name.len() as u64,
            )
        };
        trace!(symbol = name, address = %RemoteAddress::new(address), "resolved symbol");
        RemoteAddress::new(address)
    }

    fn read_bytes(&self, address: RemoteAddress, size: u64) -> Result<RemoteBytes<'_>> {
        let len = usize::try_from(size).map_err(|_| Error::SizeOverflow(size))?;

        let mut free: Option<FreeBytesFn> = None;
        let mut free_context: *mut c_void = ptr::null_mut();
        let bytes = unsafe {
            (self.entry.read_bytes)(
                self.context,
                address.address_data(),
                size,
                &mut free,
                &mut free_context,
            )
        };

        // A null buffer is a failed read no matter what release was offered
        let Some(bytes) = NonNull::new(bytes.cast_mut().cast::<u8>()) else {
            trace!(%address, size, "backend could not read");
            return Err(Error::ReadFailed { address, size });
        };
        trace!(%address, size, "read bytes");

        let release = free.map(|free| {
            Box::new(move || unsafe { free(bytes.as_ptr().cast_const().cast(), free_context) })
                as Box<dyn FnOnce()>
        });

        // SAFETY: the backend guarantees `len` readable bytes until `free`
        // runs; `release` is invoked exactly once by `RemoteBytes`.
        Ok(unsafe { RemoteBytes::from_raw_parts(bytes, len, release) })
    }

    fn string_length(&self, address: RemoteAddress) -> u64 {
        let length = unsafe { (self.entry.get_string_length)(self.context, address.address_data()) };
        if !self.options.accepts_string_length(length) {
            warn!(%address, length, max = ?self.options.max_string_length, "string length over limit");
            return 0;
        }
        length
    }
}
