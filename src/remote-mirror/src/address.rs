//! Remote Addresses
//!
//! Locations in the target address space.

use std::fmt;

/// An address in the target's address space.
///
/// The width is whatever the backend uses, carried as a `u64` so a 64-bit
/// target can be inspected from a 32-bit host. Zero doubles as the
/// "not found" sentinel for symbol lookups, which makes a symbol genuinely
/// located at address zero indistinguishable from a miss.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RemoteAddress(u64);

impl RemoteAddress {
    /// The invalid address returned by failed symbol lookups
    pub const NULL: RemoteAddress = RemoteAddress(0);

    pub const fn new(address: u64) -> Self {
        Self(address)
    }

    /// Raw address value as passed across the C boundary
    pub const fn address_data(self) -> u64 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 != 0
    }

    /// Address `delta` bytes further on, or `None` on overflow
    pub fn offset(self, delta: u64) -> Option<Self> {
        self.0.checked_add(delta).map(Self)
    }
}

impl From<u64> for RemoteAddress {
    fn from(address: u64) -> Self {
        Self(address)
    }
}

impl From<RemoteAddress> for u64 {
    fn from(address: RemoteAddress) -> Self {
        address.0
    }
}

impl fmt::Display for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl fmt::LowerHex for RemoteAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}
