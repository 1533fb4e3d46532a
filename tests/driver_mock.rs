//! User-mode mock tests for the driver lifecycle.
//!
//! Direct unit testing in kernel mode is impractical, so these tests drive
//! `DriverLifecycle` with user-space stand-ins for its collaborators.
//!
//! Key responsibilities:
//! - Verify the registry-path duplicate round-trips byte-for-byte.
//! - Verify release accounting with a counting pool (one release per
//!   allocation, on every exit path).
//! - Simulate pool exhaustion at load time and check nothing is held or
//!   registered afterwards.
//! - Capture diagnostics and check the lifecycle trace.
//!
//! Note: these tests never interact with a live kernel driver.

use std::alloc::{Layout, alloc, dealloc};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::mem::align_of;
use std::ptr::NonNull;

use helloworld_driver::{
    DRIVER_TAG, DiagnosticSink, DriverLifecycle, HostContext, LoadError, PagedPool, PoolTag,
    RegistryPath,
};

const TEST_PATH: &str = r"\REGISTRY\MACHINE\SYSTEM\Test";

/*──────────────────────────── mocks ────────────────────────────────────*/

/// Paged-pool stand-in that counts allocations and releases and can be
/// flipped into an exhausted state.
#[derive(Default)]
struct CountingPool {
    allocations: Cell<usize>,
    releases: Cell<usize>,
    exhausted: Cell<bool>,
    last_tag: Cell<Option<PoolTag>>,
}

impl PagedPool for CountingPool {
    fn allocate(&self, size: usize, tag: PoolTag) -> Option<NonNull<u8>> {
        if self.exhausted.get() {
            return None;
        }
        self.allocations.set(self.allocations.get() + 1);
        self.last_tag.set(Some(tag));
        if size == 0 {
            return Some(NonNull::<u16>::dangling().cast());
        }
        let layout = Layout::from_size_align(size, align_of::<u16>()).ok()?;
        NonNull::new(unsafe { alloc(layout) })
    }

    unsafe fn release(&self, ptr: NonNull<u8>, size: usize) {
        self.releases.set(self.releases.get() + 1);
        if size > 0 {
            let layout = Layout::from_size_align(size, align_of::<u16>()).unwrap();
            unsafe { dealloc(ptr.as_ptr(), layout) };
        }
    }
}

/// Collects every diagnostic line for assertions.
#[derive(Default)]
struct CaptureSink {
    lines: RefCell<Vec<String>>,
}

impl CaptureSink {
    fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|line| line.contains(needle))
    }
}

impl DiagnosticSink for CaptureSink {
    fn info(&self, msg: fmt::Arguments<'_>) {
        self.lines.borrow_mut().push(msg.to_string());
    }

    fn error(&self, msg: fmt::Arguments<'_>) {
        self.lines.borrow_mut().push(format!("ERROR: {msg}"));
    }
}

fn utf16(path: &str) -> Vec<u16> {
    path.encode_utf16().collect()
}

/*──────────────────────────── tests ────────────────────────────────────*/

#[test]
fn load_duplicates_the_supplied_path() {
    let pool = CountingPool::default();
    let sink = CaptureSink::default();
    let mut lifecycle = DriverLifecycle::new(&pool, &sink);
    let mut host = HostContext::new();

    let units = utf16(TEST_PATH);
    assert_eq!(units.len(), 29);

    lifecycle
        .on_load(&mut host, RegistryPath::new(&units))
        .expect("load must succeed");

    let copy = lifecycle.registry_path().expect("state must be Loaded");
    assert_eq!(copy.byte_len(), 58);
    assert_eq!(copy.as_units(), units.as_slice());
    assert_eq!(copy.to_text(), TEST_PATH);
    assert!(host.teardown_registered());
    assert_eq!(pool.last_tag.get(), Some(DRIVER_TAG));
}

#[test]
fn copy_is_independent_of_the_host_buffer() {
    let pool = CountingPool::default();
    let sink = CaptureSink::default();
    let mut lifecycle = DriverLifecycle::new(&pool, &sink);
    let mut host = HostContext::new();

    let mut units = utf16(TEST_PATH);
    lifecycle
        .on_load(&mut host, RegistryPath::new(&units))
        .expect("load must succeed");

    {
        let copy = lifecycle.registry_path().unwrap();
        assert_ne!(copy.as_ptr(), units.as_ptr().cast());
    }

    // The host may reuse its storage as soon as on_load returns.
    units.fill(0);
    assert_eq!(lifecycle.registry_path().unwrap().to_text(), TEST_PATH);
}

#[test]
fn exhausted_pool_fails_load_without_registering_teardown() {
    let pool = CountingPool::default();
    pool.exhausted.set(true);
    let sink = CaptureSink::default();
    let mut lifecycle = DriverLifecycle::new(&pool, &sink);
    let mut host = HostContext::new();

    let units = utf16(TEST_PATH);
    let err = lifecycle
        .on_load(&mut host, RegistryPath::new(&units))
        .expect_err("exhausted pool must fail the load");

    assert_eq!(err, LoadError::ResourceExhausted);
    assert!(!lifecycle.is_loaded());
    assert!(!host.teardown_registered());
    assert!(sink.contains("Error allocating memory!"));

    drop(lifecycle);
    assert_eq!(pool.allocations.get(), 0);
    assert_eq!(pool.releases.get(), 0);
}

#[test]
fn unload_releases_the_copy_exactly_once() {
    let pool = CountingPool::default();
    let sink = CaptureSink::default();
    let mut lifecycle = DriverLifecycle::new(&pool, &sink);
    let mut host = HostContext::new();

    let units = utf16(TEST_PATH);
    lifecycle
        .on_load(&mut host, RegistryPath::new(&units))
        .expect("load must succeed");
    lifecycle.on_unload(&mut host);

    assert!(!lifecycle.is_loaded());
    assert!(sink.contains("Bye Bye from HelloWorld Driver"));
    assert_eq!(pool.allocations.get(), 1);
    assert_eq!(pool.releases.get(), 1);

    // Dropping the lifecycle afterwards must not release again.
    drop(lifecycle);
    assert_eq!(pool.releases.get(), 1);
}

#[test]
fn zero_length_path_loads_and_releases() {
    let pool = CountingPool::default();
    let sink = CaptureSink::default();
    let mut lifecycle = DriverLifecycle::new(&pool, &sink);
    let mut host = HostContext::new();

    lifecycle
        .on_load(&mut host, RegistryPath::new(&[]))
        .expect("a zero-length path is a valid load");

    {
        let copy = lifecycle.registry_path().unwrap();
        assert!(copy.is_empty());
        assert_eq!(copy.byte_len(), 0);
        assert_eq!(copy.to_text(), "");
    }
    assert!(host.teardown_registered());

    lifecycle.on_unload(&mut host);
    assert_eq!(pool.allocations.get(), 1);
    assert_eq!(pool.releases.get(), 1);
}

#[test]
fn dropping_a_loaded_lifecycle_releases_once() {
    let pool = CountingPool::default();
    let sink = CaptureSink::default();
    let mut lifecycle = DriverLifecycle::new(&pool, &sink);
    let mut host = HostContext::new();

    let units = utf16(TEST_PATH);
    lifecycle
        .on_load(&mut host, RegistryPath::new(&units))
        .expect("load must succeed");

    drop(lifecycle);
    assert_eq!(pool.allocations.get(), 1);
    assert_eq!(pool.releases.get(), 1);
}

#[test]
fn unload_without_load_is_a_noop() {
    let pool = CountingPool::default();
    let sink = CaptureSink::default();
    let mut lifecycle = DriverLifecycle::new(&pool, &sink);
    let mut host = HostContext::new();

    // Out of contract for the host, but must not touch the pool.
    lifecycle.on_unload(&mut host);

    assert_eq!(pool.releases.get(), 0);
    assert!(sink.contains("Bye Bye from HelloWorld Driver"));
}

#[test]
fn diagnostics_trace_the_lifecycle() {
    let pool = CountingPool::default();
    let sink = CaptureSink::default();
    let mut lifecycle = DriverLifecycle::new(&pool, &sink);
    let mut host = HostContext::new();

    let units = utf16(TEST_PATH);
    lifecycle
        .on_load(&mut host, RegistryPath::new(&units))
        .expect("load must succeed");

    assert!(sink.contains("HelloWorld from the Kernel Land!"));
    assert!(sink.contains("Driver Object:"));
    assert!(sink.contains("Registry Path:"));
    assert!(sink.contains(&format!("Parameter Key copy: {TEST_PATH}")));

    lifecycle.on_unload(&mut host);
    assert!(sink.contains("Bye Bye from HelloWorld Driver"));
}
