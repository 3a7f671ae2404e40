//! Mock Memory Reader
//!
//! An in-memory target for exercising readers and adapters. Hands out views
//! into its own image and counts every read and release.

use crate::{Error, MemoryReader, RemoteAddress, RemoteBytes, Result};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::ptr::NonNull;

/// A mock target: one contiguous memory image plus a symbol table
pub struct MockMemoryReader {
    /// Raw memory data (contiguous, starting at base_address)
    data: Vec<u8>,
    /// Base remote address of the image
    base_address: u64,
    pointer_size: u8,
    size_size: u8,
    symbols: HashMap<String, u64>,
    /// Lengths reported instead of scanning the image for a terminator
    string_lengths: RefCell<HashMap<u64, u64>>,
    /// Hand back one byte less than requested, breaking the read contract
    short_reads: bool,
    reads: RefCell<Vec<(RemoteAddress, u64)>>,
    releases: Cell<usize>,
}

impl MockMemoryReader {
    /// Create a new mock with data at the given base address
    pub fn new(base_address: u64, data: Vec<u8>) -> Self {
        Self {
            data,
            base_address,
            pointer_size: 8,
            size_size: 8,
            symbols: HashMap::new(),
            string_lengths: RefCell::new(HashMap::new()),
            short_reads: false,
            reads: RefCell::new(Vec::new()),
            releases: Cell::new(0),
        }
    }

    pub fn with_widths(mut self, pointer_size: u8, size_size: u8) -> Self {
        self.pointer_size = pointer_size;
        self.size_size = size_size;
        self
    }

    pub fn with_symbol(mut self, name: &str, address: u64) -> Self {
        self.symbols.insert(name.to_string(), address);
        self
    }

    pub fn with_short_reads(mut self) -> Self {
        self.short_reads = true;
        self
    }

    /// Override what the length query reports for `address`
    pub fn set_string_length(&self, address: u64, length: u64) {
        self.string_lengths.borrow_mut().insert(address, length);
    }

    pub fn read_calls(&self) -> usize {
        self.reads.borrow().len()
    }

    /// Every `(address, size)` passed to `read_bytes`, in order
    pub fn read_log(&self) -> Vec<(RemoteAddress, u64)> {
        self.reads.borrow().clone()
    }

    pub fn release_count(&self) -> usize {
        self.releases.get()
    }

    fn slice(&self, address: u64, size: u64) -> Option<&[u8]> {
        let start = usize::try_from(address.checked_sub(self.base_address)?).ok()?;
        let end = start.checked_add(usize::try_from(size).ok()?)?;
        self.data.get(start..end)
    }
}

impl MemoryReader for MockMemoryReader {
    fn pointer_size(&self) -> u8 {
        self.pointer_size
    }

    fn size_size(&self) -> u8 {
        self.size_size
    }

    fn symbol_address(&self, name: &str) -> RemoteAddress {
        self.symbols
            .get(name)
            .copied()
            .map(RemoteAddress::new)
            .unwrap_or(RemoteAddress::NULL)
    }

    fn read_bytes(&self, address: RemoteAddress, size: u64) -> Result<RemoteBytes<'_>> {
        self.reads.borrow_mut().push((address, size));

        let bytes = self
            .slice(address.address_data(), size)
            .ok_or(Error::ReadFailed { address, size })?;
        let bytes = match bytes.split_last() {
            Some((_, head)) if self.short_reads => head,
            _ => bytes,
        };
        let releases = &self.releases;

        // SAFETY: the view points into `self.data`, which is never mutated
        // and outlives the returned buffer.
        Ok(unsafe {
            RemoteBytes::from_raw_parts(
                NonNull::from(bytes).cast(),
                bytes.len(),
                Some(Box::new(move || releases.set(releases.get() + 1))),
            )
        })
    }

    fn string_length(&self, address: RemoteAddress) -> u64 {
        let raw = address.address_data();
        if let Some(&length) = self.string_lengths.borrow().get(&raw) {
            return length;
        }

        let Some(start) = raw
            .checked_sub(self.base_address)
            .and_then(|offset| usize::try_from(offset).ok())
        else {
            return 0;
        };
        self.data
            .get(start..)
            .and_then(|rest| rest.iter().position(|&b| b == 0))
            .map(|len| len as u64)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_read_bytes() {
        let mock = MockMemoryReader::new(0x1000, vec![0x41, 0x42, 0x43, 0x44]);

        let result = mock.read_bytes(RemoteAddress::new(0x1000), 4).unwrap();
        assert_eq!(&*result, b"ABCD");
        drop(result);

        let partial = mock.read_bytes(RemoteAddress::new(0x1001), 2).unwrap();
        assert_eq!(&*partial, b"BC");
        drop(partial);

        assert_eq!(mock.release_count(), 2);
        assert_eq!(mock.read_calls(), 2);
    }

    #[test]
    fn test_mock_read_out_of_bounds() {
        let mock = MockMemoryReader::new(0x1000, vec![0; 4]);

        assert!(mock.read_bytes(RemoteAddress::new(0x1002), 10).is_err());
        assert!(mock.read_bytes(RemoteAddress::new(0x500), 4).is_err());
        assert!(mock.read_bytes(RemoteAddress::new(u64::MAX), 4).is_err());
        assert_eq!(mock.release_count(), 0);
    }

    #[test]
    fn test_mock_symbols() {
        let mock = MockMemoryReader::new(0x1000, vec![]).with_symbol("foo", 0x1000);
        assert_eq!(mock.symbol_address("foo"), RemoteAddress::new(0x1000));
        assert_eq!(mock.symbol_address("bar"), RemoteAddress::NULL);
    }

    #[test]
    fn test_mock_string_length() {
        let mock = MockMemoryReader::new(0x1000, b"Hello\0World\0".to_vec());
        assert_eq!(mock.string_length(RemoteAddress::new(0x1000)), 5);
        assert_eq!(mock.string_length(RemoteAddress::new(0x1006)), 5);
        assert_eq!(mock.string_length(RemoteAddress::new(0x0fff)), 0);

        mock.set_string_length(0x1000, 2);
        assert_eq!(mock.string_length(RemoteAddress::new(0x1000)), 2);
        assert_eq!(mock.read_calls(), 0);
    }
}
