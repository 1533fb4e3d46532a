//! Minimal WDM hello-world driver.
//!
//! On load the driver duplicates the loader-supplied registry path into a
//! paged-pool block tagged `hwdb`; on unload it releases the duplicate and
//! logs a farewell. No device object, no IRP dispatch, no hardware.
//!
//! The lifecycle core is host-testable: the paged pool and the diagnostic
//! channel are injected, so the user-mode tests in `tests/` exercise the
//! exact load/unload logic the kernel binding runs. Build with
//! `--no-default-features --features kernel` for the real driver.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

#[cfg(all(feature = "kernel", not(test)))]
extern crate wdk_panic;

#[cfg(all(feature = "kernel", not(test)))]
use wdk_alloc::WdkAllocator;

#[cfg(all(feature = "kernel", not(test)))]
#[global_allocator]
static GLOBAL: WdkAllocator = WdkAllocator;

mod consts;
mod diag;
mod error;
mod lifecycle;
mod path_copy;
mod pool;

pub use consts::DRIVER_TAG;
#[cfg(feature = "kernel")]
pub use diag::DbgPrintSink;
pub use diag::{DiagnosticSink, LogSink};
pub use error::LoadError;
pub use lifecycle::{DriverLifecycle, HostContext};
pub use path_copy::{OwnedPathCopy, RegistryPath};
#[cfg(feature = "kernel")]
pub use pool::KernelPool;
pub use pool::{HeapPool, PagedPool, PoolTag};

/*──────────────────────────── kernel binding ───────────────────────────*/

#[cfg(feature = "kernel")]
mod entry {
    use alloc::boxed::Box;
    use core::{
        ptr,
        ptr::NonNull,
        slice,
        sync::atomic::{AtomicPtr, Ordering},
    };

    use wdk_sys::{DRIVER_OBJECT, NTSTATUS, PCUNICODE_STRING, STATUS_SUCCESS};

    use crate::diag::DbgPrintSink;
    use crate::lifecycle::{DriverLifecycle, HostContext};
    use crate::path_copy::RegistryPath;
    use crate::pool::KernelPool;

    type KernelLifecycle = DriverLifecycle<KernelPool, DbgPrintSink>;

    /// Live lifecycle between a successful `DriverEntry` and unload.
    static LIFECYCLE: AtomicPtr<KernelLifecycle> = AtomicPtr::new(ptr::null_mut());

    #[allow(non_snake_case)]
    #[unsafe(export_name = "DriverEntry")]
    pub extern "system" fn driver_entry(
        driver: *mut DRIVER_OBJECT,
        registry_path: PCUNICODE_STRING,
    ) -> NTSTATUS {
        // Length is in bytes; the buffer holds Length / 2 UTF-16 units and is
        // only valid for the duration of this call.
        let units = unsafe {
            let us = &*registry_path;
            slice::from_raw_parts(us.Buffer, (us.Length / 2) as usize)
        };

        let mut lifecycle = Box::new(DriverLifecycle::new(KernelPool, DbgPrintSink));
        let mut host = HostContext::new();
        match lifecycle.on_load(&mut host, RegistryPath::new(units)) {
            Ok(()) => {
                LIFECYCLE.store(Box::into_raw(lifecycle), Ordering::Release);
                if host.teardown_registered() {
                    unsafe { (*driver).DriverUnload = Some(driver_exit) };
                }
                STATUS_SUCCESS
            }
            // Failed load holds nothing; the box drops here and the loader
            // never calls back.
            Err(err) => err.to_ntstatus(),
        }
    }

    extern "C" fn driver_exit(_driver: *mut DRIVER_OBJECT) {
        if let Some(raw) = NonNull::new(LIFECYCLE.swap(ptr::null_mut(), Ordering::AcqRel)) {
            let mut lifecycle = unsafe { Box::from_raw(raw.as_ptr()) };
            let mut host = HostContext::new();
            lifecycle.on_unload(&mut host);
        }
    }
}
