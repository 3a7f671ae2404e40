//! Typed Reads
//!
//! Fixed-width helpers built on [`MemoryReader::read_bytes`]. Integers are
//! decoded little-endian.

use crate::reader::read_exact;
use crate::{Error, MemoryReader, RemoteAddress, Result};
use byteorder::{ByteOrder, LE};

/// Extension methods available on every [`MemoryReader`]
pub trait MemoryReaderExt: MemoryReader {
    /// Copy `dest.len()` bytes from `address` into `dest`
    fn read_into(&self, address: RemoteAddress, dest: &mut [u8]) -> Result<()> {
        let bytes = read_exact(self, address, dest.len() as u64)?;
        dest.copy_from_slice(&bytes);
        Ok(())
    }

    fn read_u8(&self, address: RemoteAddress) -> Result<u8> {
        let bytes = read_exact(self, address, 1)?;
        Ok(bytes[0])
    }

    fn read_u16(&self, address: RemoteAddress) -> Result<u16> {
        let bytes = read_exact(self, address, 2)?;
        Ok(LE::read_u16(&bytes))
    }

    fn read_u32(&self, address: RemoteAddress) -> Result<u32> {
        let bytes = read_exact(self, address, 4)?;
        Ok(LE::read_u32(&bytes))
    }

    fn read_u64(&self, address: RemoteAddress) -> Result<u64> {
        let bytes = read_exact(self, address, 8)?;
        Ok(LE::read_u64(&bytes))
    }

    /// Read a target pointer, sized by [`MemoryReader::pointer_size`]
    fn read_pointer(&self, address: RemoteAddress) -> Result<RemoteAddress> {
        self.read_word(address, self.pointer_size())
            .map(RemoteAddress::new)
    }

    /// Read a target size value, sized by [`MemoryReader::size_size`]
    fn read_size(&self, address: RemoteAddress) -> Result<u64> {
        self.read_word(address, self.size_size())
    }

    /// Read an unsigned 4- or 8-byte value
    fn read_word(&self, address: RemoteAddress, width: u8) -> Result<u64> {
        match width {
            4 => self.read_u32(address).map(u64::from),
            8 => self.read_u64(address),
            other => Err(Error::UnsupportedWidth(other)),
        }
    }

    /// Resolve a symbol, mapping the zero sentinel to `None`
    fn lookup_symbol(&self, name: &str) -> Option<RemoteAddress> {
        Some(self.symbol_address(name)).filter(|address| address.is_valid())
    }
}

impl<R: MemoryReader + ?Sized> MemoryReaderExt for R {}
