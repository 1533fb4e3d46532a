//! Registry-path descriptors and the single owned duplicate.

use core::mem::size_of;
use core::ptr::NonNull;
use core::{ptr, slice};

use alloc::string::String;

use crate::error::LoadError;
use crate::pool::{PagedPool, PoolTag};

/*──────────────────────────── borrowed path ────────────────────────────*/

/// Borrowed UTF-16 registry path handed in by the loader. Valid only for the
/// duration of the call it arrives on; anything that must outlive the call
/// goes through [`OwnedPathCopy::duplicate`].
#[derive(Clone, Copy, Debug)]
pub struct RegistryPath<'a> {
    units: &'a [u16],
}

impl<'a> RegistryPath<'a> {
    pub fn new(units: &'a [u16]) -> Self {
        Self { units }
    }

    /// Length in bytes, the unit the pool deals in.
    pub fn byte_len(&self) -> usize {
        self.units.len() * size_of::<u16>()
    }

    pub fn as_units(&self) -> &'a [u16] {
        self.units
    }

    pub fn to_text(&self) -> String {
        String::from_utf16_lossy(self.units)
    }
}

impl<'a> From<&'a [u16]> for RegistryPath<'a> {
    fn from(units: &'a [u16]) -> Self {
        Self::new(units)
    }
}

/*──────────────────────────── owned copy ───────────────────────────────*/

/// The single heap-allocated duplicate of the loader-supplied registry path.
///
/// Sized exactly to the supplied byte length (capacity == length, no slack),
/// immutable between creation and destruction, and handed back to its pool
/// exactly once on drop, whatever the exit path.
pub struct OwnedPathCopy<P: PagedPool> {
    pool: P,
    block: NonNull<u8>,
    len: usize,
}

impl<P: PagedPool> OwnedPathCopy<P> {
    /// Duplicate `path` into a fresh `tag`-stamped pool block.
    pub fn duplicate(pool: P, path: RegistryPath<'_>, tag: PoolTag) -> Result<Self, LoadError> {
        let len = path.byte_len();
        let block = pool.allocate(len, tag).ok_or(LoadError::ResourceExhausted)?;
        if len > 0 {
            // SAFETY: `block` spans `len` writable bytes and cannot overlap
            // the borrowed source.
            unsafe {
                ptr::copy_nonoverlapping(path.as_units().as_ptr().cast::<u8>(), block.as_ptr(), len);
            }
        }
        Ok(Self { pool, block, len })
    }

    pub fn byte_len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.block.as_ptr()
    }

    pub fn as_units(&self) -> &[u16] {
        // SAFETY: the pool contract guarantees 2-aligned blocks and the copy
        // wrote `len / 2` code units.
        unsafe { slice::from_raw_parts(self.block.as_ptr().cast::<u16>(), self.len / size_of::<u16>()) }
    }

    pub fn to_text(&self) -> String {
        String::from_utf16_lossy(self.as_units())
    }
}

impl<P: PagedPool> Drop for OwnedPathCopy<P> {
    fn drop(&mut self) {
        // SAFETY: `block` came from this pool's `allocate` with `len` and is
        // released exactly once.
        unsafe { self.pool.release(self.block, self.len) };
    }
}
