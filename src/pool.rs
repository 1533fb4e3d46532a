//! Paged-pool abstraction.
//!
//! The lifecycle core never calls an allocator directly; it goes through
//! [`PagedPool`] so user-mode tests can substitute a counting pool while the
//! kernel build routes to `ExAllocatePool2`/`ExFreePool`.

use core::alloc::Layout;
use core::mem::align_of;
use core::ptr::NonNull;

use alloc::alloc::{alloc, dealloc};

/*──────────────────────────── pool tag ─────────────────────────────────*/

/// Fixed 4-byte allocation tag. Diagnosability only; carries no behavioral
/// meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PoolTag(u32);

impl PoolTag {
    pub const fn new(tag: &[u8; 4]) -> Self {
        Self(u32::from_ne_bytes(*tag))
    }

    pub const fn as_u32(self) -> u32 {
        self.0
    }

    pub const fn as_bytes(self) -> [u8; 4] {
        self.0.to_ne_bytes()
    }
}

/*──────────────────────────── trait ────────────────────────────────────*/

/// Memory-pool collaborator. The lifecycle is the sole caller for its tagged
/// allocations and must release exactly what it allocated, exactly once.
///
/// Contract for implementors:
/// * returned blocks are aligned for UTF-16 storage (2 bytes);
/// * a size-0 request yields a valid, trivially-releasable block;
/// * `None` from `allocate` signals exhaustion, the only failure mode.
pub trait PagedPool {
    /// Allocate `size` bytes stamped with `tag`.
    fn allocate(&self, size: usize, tag: PoolTag) -> Option<NonNull<u8>>;

    /// Hand a block back to the pool.
    ///
    /// # Safety
    /// `ptr` must come from `allocate` on this same pool with this exact
    /// `size`, and must not be released twice.
    unsafe fn release(&self, ptr: NonNull<u8>, size: usize);
}

impl<P: PagedPool + ?Sized> PagedPool for &P {
    fn allocate(&self, size: usize, tag: PoolTag) -> Option<NonNull<u8>> {
        (**self).allocate(size, tag)
    }

    unsafe fn release(&self, ptr: NonNull<u8>, size: usize) {
        unsafe { (**self).release(ptr, size) }
    }
}

/*──────────────────────────── host pool ────────────────────────────────*/

/// Host-side pool over the global allocator. Accepts the tag for contract
/// parity and ignores it.
#[derive(Clone, Copy, Debug, Default)]
pub struct HeapPool;

impl PagedPool for HeapPool {
    fn allocate(&self, size: usize, _tag: PoolTag) -> Option<NonNull<u8>> {
        if size == 0 {
            return Some(NonNull::<u16>::dangling().cast());
        }
        let layout = Layout::from_size_align(size, align_of::<u16>()).ok()?;
        // SAFETY: `layout` has non-zero size.
        NonNull::new(unsafe { alloc(layout) })
    }

    unsafe fn release(&self, ptr: NonNull<u8>, size: usize) {
        if size == 0 {
            return;
        }
        // SAFETY: size and alignment were validated when the block was
        // allocated; caller guarantees `ptr` came from that allocation.
        unsafe {
            let layout = Layout::from_size_align_unchecked(size, align_of::<u16>());
            dealloc(ptr.as_ptr(), layout);
        }
    }
}

/*──────────────────────────── kernel pool ──────────────────────────────*/

#[cfg(feature = "kernel")]
mod kernel {
    use core::ptr::NonNull;

    use wdk_sys::{
        POOL_FLAG_PAGED,
        ntddk::{ExAllocatePool2, ExFreePool},
    };

    use super::{PagedPool, PoolTag};

    /// Tagged paged-pool allocator over `ExAllocatePool2`/`ExFreePool`.
    #[derive(Clone, Copy, Default)]
    pub struct KernelPool;

    impl PagedPool for KernelPool {
        fn allocate(&self, size: usize, tag: PoolTag) -> Option<NonNull<u8>> {
            if size == 0 {
                return Some(NonNull::<u16>::dangling().cast());
            }
            let ptr = unsafe { ExAllocatePool2(POOL_FLAG_PAGED, size as _, tag.as_u32()) };
            NonNull::new(ptr.cast())
        }

        unsafe fn release(&self, ptr: NonNull<u8>, size: usize) {
            if size > 0 {
                // SAFETY: caller guarantees `ptr` is a live `ExAllocatePool2`
                // block from this pool.
                unsafe { ExFreePool(ptr.as_ptr().cast()) };
            }
        }
    }
}

#[cfg(feature = "kernel")]
pub use kernel::KernelPool;
