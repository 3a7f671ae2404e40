//! Scoped Remote Buffers
//!
//! A view of bytes read from a target, bundled with the action that hands
//! the storage back to the backend that produced it.

use std::fmt;
use std::marker::PhantomData;
use std::ops::Deref;
use std::ptr::NonNull;
use std::slice;

type Release<'r> = Box<dyn FnOnce() + 'r>;

/// Bytes produced by a single [`MemoryReader::read_bytes`] call.
///
/// The storage belongs to the backend. The holder of a `RemoteBytes` owns
/// the obligation to give it back, which is discharged exactly once: when
/// the value is dropped, or explicitly through [`RemoteBytes::release`].
/// Both consume the value, so the view cannot outlive its release.
///
/// [`MemoryReader::read_bytes`]: crate::MemoryReader::read_bytes
pub struct RemoteBytes<'r> {
    ptr: NonNull<u8>,
    len: usize,
    release: Option<Release<'r>>,
    _view: PhantomData<&'r [u8]>,
}

impl<'r> RemoteBytes<'r> {
    /// Wrap bytes a native backend already copied into host memory
    pub fn from_vec(bytes: Vec<u8>) -> Self {
        let storage = NonNull::from(Box::leak(bytes.into_boxed_slice()));
        let len = storage.len();
        let release: Release<'r> = Box::new(move || {
            // SAFETY: `storage` came from `Box::leak` above and the release
            // closure runs at most once.
            drop(unsafe { Box::from_raw(storage.as_ptr()) });
        });

        Self {
            ptr: storage.cast(),
            len,
            release: Some(release),
            _view: PhantomData,
        }
    }

    /// Wrap backend-owned storage.
    ///
    /// `release`, when present, is invoked exactly once after the last
    /// access to the view. `None` means the backend keeps the memory alive
    /// on its own.
    ///
    /// # Safety
    ///
    /// `ptr` must be valid for reads of `len` bytes until `release` runs (or
    /// for `'r` when there is no release), and the bytes must not be mutated
    /// in that window.
    pub unsafe fn from_raw_parts(
        ptr: NonNull<u8>,
        len: usize,
        release: Option<Box<dyn FnOnce() + 'r>>,
    ) -> Self {
        Self {
            ptr,
            len,
            release,
            _view: PhantomData,
        }
    }

    /// Whether dropping this buffer will call back into the backend
    pub fn has_release(&self) -> bool {
        self.release.is_some()
    }

    /// Give the buffer back to the backend now instead of at end of scope
    pub fn release(self) {
        drop(self);
    }

    /// Copy the bytes out and release the buffer
    pub fn into_vec(self) -> Vec<u8> {
        self.to_vec()
    }
}

impl Deref for RemoteBytes<'_> {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        // SAFETY: guaranteed by the constructors; the release has not run
        // because it only runs in `drop`.
        unsafe { slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl AsRef<[u8]> for RemoteBytes<'_> {
    fn as_ref(&self) -> &[u8] {
        self
    }
}

impl Drop for RemoteBytes<'_> {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for RemoteBytes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemoteBytes")
            .field("len", &self.len)
            .field("has_release", &self.has_release())
            .finish_non_exhaustive()
    }
}
