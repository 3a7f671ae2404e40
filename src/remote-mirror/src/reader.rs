//! Memory Reader Trait
//!
//! Core abstraction for reading memory out of a target address space.

use crate::{Error, RemoteAddress, RemoteBytes, Result};
use tracing::trace;

/// Bytes requested per read while scanning for a string terminator
pub const STRING_SCAN_CHUNK: u64 = 64;

/// Longest string the default [`MemoryReader::string_length`] will find
pub const MAX_SCANNED_STRING: u64 = 64 * 1024;

/// [`MemoryReader::read_bytes`] that also rejects a short buffer.
///
/// Backends are expected to return exactly `size` bytes; the provided
/// methods go through here so one that does not cannot make them panic.
pub(crate) fn read_exact<R: MemoryReader + ?Sized>(
    reader: &R,
    address: RemoteAddress,
    size: u64,
) -> Result<RemoteBytes<'_>> {
    let bytes = reader.read_bytes(address, size)?;
    if bytes.len() as u64 != size {
        trace!(%address, size, returned = bytes.len(), "backend returned a short buffer");
        return Err(Error::ReadFailed { address, size });
    }
    Ok(bytes)
}

/// Trait for reading memory from a target (live process, core dump, plugin, mock).
///
/// Implementations carry no synchronization of their own. Unless a backend
/// documents otherwise, serialize access to a single reader.
pub trait MemoryReader {
    /// Width of a pointer on the target, in bytes
    fn pointer_size(&self) -> u8;

    /// Width of the target's size/length type, in bytes
    fn size_size(&self) -> u8;

    /// Resolve a symbol in the target.
    ///
    /// Returns [`RemoteAddress::NULL`] when the symbol is unknown. Check
    /// [`RemoteAddress::is_valid`] before using the result. A symbol that
    /// really lives at address zero looks the same as a miss.
    fn symbol_address(&self, name: &str) -> RemoteAddress;

    /// Read exactly `size` bytes starting at `address`.
    ///
    /// Fails rather than returning fewer bytes than requested.
    fn read_bytes(&self, address: RemoteAddress, size: u64) -> Result<RemoteBytes<'_>>;

    /// Length of the string stored at `address`, excluding any terminator.
    ///
    /// Zero means there is no string there. The default scans for a NUL
    /// byte through [`MemoryReader::read_bytes`], giving up (and returning
    /// zero) at unreadable memory or after [`MAX_SCANNED_STRING`] bytes.
    fn string_length(&self, address: RemoteAddress) -> u64 {
        let mut length = 0;
        while length < MAX_SCANNED_STRING {
            let Some(cursor) = address.offset(length) else {
                return 0;
            };
            let chunk = STRING_SCAN_CHUNK.min(MAX_SCANNED_STRING - length);

            match read_exact(self, cursor, chunk) {
                Ok(bytes) => {
                    if let Some(end) = bytes.iter().position(|&b| b == 0) {
                        return length + end as u64;
                    }
                }
                // The chunk may run past the end of a mapping, so retry byte by byte
                Err(_) => {
                    for i in 0..chunk {
                        let byte = cursor
                            .offset(i)
                            .and_then(|at| read_exact(self, at, 1).ok())
                            .and_then(|b| b.first().copied());
                        match byte {
                            Some(0) => return length + i,
                            Some(_) => {}
                            None => {
                                trace!(%address, scanned = length + i, "string runs into unreadable memory");
                                return 0;
                            }
                        }
                    }
                }
            }
            length += chunk;
        }

        trace!(%address, "no string terminator within scan limit");
        0
    }

    /// Read the raw bytes of the string at `address`.
    ///
    /// `Ok(None)` when [`MemoryReader::string_length`] reports no string; no
    /// bytes are read in that case. Otherwise performs a single
    /// [`MemoryReader::read_bytes`] of exactly that length and copies the
    /// bytes out unchanged, releasing the buffer before returning.
    fn read_string_bytes(&self, address: RemoteAddress) -> Result<Option<Vec<u8>>> {
        let length = self.string_length(address);
        if length == 0 {
            return Ok(None);
        }

        let bytes = read_exact(self, address, length)?;
        Ok(Some(bytes.into_vec()))
    }

    /// Read the string at `address` into an owned `String`.
    ///
    /// Same reads and release as [`MemoryReader::read_string_bytes`].
    /// Invalid UTF-8 is replaced lossily, so the result is not a
    /// byte-for-byte copy of target memory in that case; use
    /// `read_string_bytes` when the exact bytes matter.
    fn read_string(&self, address: RemoteAddress) -> Result<Option<String>> {
        Ok(self.read_string_bytes(address)?.map(|bytes| {
            String::from_utf8(bytes)
                .unwrap_or_else(|err| String::from_utf8_lossy(err.as_bytes()).into_owned())
        }))
    }
}

impl<R: MemoryReader + ?Sized> MemoryReader for &R {
    fn pointer_size(&self) -> u8 {
        (**self).pointer_size()
    }

    fn size_size(&self) -> u8 {
        (**self).size_size()
    }

    fn symbol_address(&self, name: &str) -> RemoteAddress {
        (**self).symbol_address(name)
    }

    fn read_bytes(&self, address: RemoteAddress, size: u64) -> Result<RemoteBytes<'_>> {
        (**self).read_bytes(address, size)
    }

    fn string_length(&self, address: RemoteAddress) -> u64 {
        (**self).string_length(address)
    }

    fn read_string_bytes(&self, address: RemoteAddress) -> Result<Option<Vec<u8>>> {
        (**self).read_string_bytes(address)
    }

    fn read_string(&self, address: RemoteAddress) -> Result<Option<String>> {
        (**self).read_string(address)
    }
}

impl<R: MemoryReader + ?Sized> MemoryReader for Box<R> {
    fn pointer_size(&self) -> u8 {
        (**self).pointer_size()
    }

    fn size_size(&self) -> u8 {
        (**self).size_size()
    }

    fn symbol_address(&self, name: &str) -> RemoteAddress {
        (**self).symbol_address(name)
    }

    fn read_bytes(&self, address: RemoteAddress, size: u64) -> Result<RemoteBytes<'_>> {
        (**self).read_bytes(address, size)
    }

    fn string_length(&self, address: RemoteAddress) -> u64 {
        (**self).string_length(address)
    }

    fn read_string_bytes(&self, address: RemoteAddress) -> Result<Option<Vec<u8>>> {
        (**self).read_string_bytes(address)
    }

    fn read_string(&self, address: RemoteAddress) -> Result<Option<String>> {
        (**self).read_string(address)
    }
}
