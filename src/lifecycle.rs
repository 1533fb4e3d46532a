//! Load/unload lifecycle: the whole of the driver's behavior.
//!
//! Two states: Unloaded (no owned copy) and Loaded (one owned copy). A
//! successful `on_load` moves Unloaded→Loaded and registers teardown with the
//! host; `on_unload` moves Loaded→Unloaded and releases the copy. A failed
//! load stays Unloaded, holds nothing and registers nothing.
//!
//! The host serializes both calls for a given driver instance, so the
//! lifecycle carries no locking of its own.

use crate::consts::DRIVER_TAG;
use crate::diag::DiagnosticSink;
use crate::error::LoadError;
use crate::path_copy::{OwnedPathCopy, RegistryPath};
use crate::pool::PagedPool;

/*──────────────────────────── host context ─────────────────────────────*/

/// Opaque stand-in for the loader's driver object. The lifecycle only ever
/// registers its teardown routine on it; the handle's address is echoed in
/// the load banner for operator visibility and means nothing beyond that.
#[derive(Debug, Default)]
pub struct HostContext {
    teardown_registered: bool,
}

impl HostContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a successful load registered the unload routine.
    pub fn teardown_registered(&self) -> bool {
        self.teardown_registered
    }

    fn register_teardown(&mut self) {
        self.teardown_registered = true;
    }
}

/*──────────────────────────── lifecycle ────────────────────────────────*/

/// Owns the pool handle, the diagnostic sink and (while Loaded) the one
/// registry-path duplicate. An explicit value rather than a global, so tests
/// instantiate independent instances.
pub struct DriverLifecycle<P: PagedPool, D: DiagnosticSink> {
    pool: P,
    diag: D,
    reg_path: Option<OwnedPathCopy<P>>,
}

impl<P: PagedPool + Clone, D: DiagnosticSink> DriverLifecycle<P, D> {
    pub fn new(pool: P, diag: D) -> Self {
        Self {
            pool,
            diag,
            reg_path: None,
        }
    }

    /// Load entry point. Duplicates `supplied` into an owned pool block; on
    /// success the copy is fully independent of the host's storage and the
    /// teardown routine is registered on `context`.
    ///
    /// Allocation failure is the one error path: it is reported to the host
    /// immediately, the owned state stays empty and no teardown is
    /// registered.
    pub fn on_load(
        &mut self,
        context: &mut HostContext,
        supplied: RegistryPath<'_>,
    ) -> Result<(), LoadError> {
        self.diag.info(format_args!("HelloWorld from the Kernel Land!"));
        self.diag
            .info(format_args!("Driver Object:\t\t{:p}", context as *const HostContext));
        self.diag
            .info(format_args!("Registry Path:\t\t{:p}", &supplied));

        let copy = match OwnedPathCopy::duplicate(self.pool.clone(), supplied, DRIVER_TAG) {
            Ok(copy) => copy,
            Err(err) => {
                self.diag.error(format_args!("Error allocating memory!"));
                return Err(err);
            }
        };

        self.diag
            .info(format_args!("Parameter Key copy: {}", copy.to_text()));
        self.reg_path = Some(copy);
        context.register_teardown();
        Ok(())
    }

    /// Unload entry point. `context` is accepted to match the host callback
    /// contract; nothing keys off its value.
    pub fn on_unload(&mut self, _context: &mut HostContext) {
        // Dropping the copy hands the block back to the pool. A lifecycle
        // that never loaded has nothing to release, so an out-of-contract
        // second unload is a no-op rather than a double free.
        self.reg_path = None;
        self.diag.info(format_args!("Bye Bye from HelloWorld Driver"));
    }

    pub fn is_loaded(&self) -> bool {
        self.reg_path.is_some()
    }

    pub fn registry_path(&self) -> Option<&OwnedPathCopy<P>> {
        self.reg_path.as_ref()
    }
}
