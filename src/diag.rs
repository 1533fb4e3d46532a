//! Diagnostic channel.
//!
//! Lifecycle diagnostics are fire-and-forget: append-only text, never
//! failing, unordered with respect to other system output. Routing them
//! through [`DiagnosticSink`] keeps the core testable without a kernel
//! logging facility.

use core::fmt;

pub trait DiagnosticSink {
    fn info(&self, msg: fmt::Arguments<'_>);
    fn error(&self, msg: fmt::Arguments<'_>);
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &S {
    fn info(&self, msg: fmt::Arguments<'_>) {
        (**self).info(msg)
    }

    fn error(&self, msg: fmt::Arguments<'_>) {
        (**self).error(msg)
    }
}

/// Host-side sink over the `log` facade.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn info(&self, msg: fmt::Arguments<'_>) {
        log::info!("{msg}");
    }

    fn error(&self, msg: fmt::Arguments<'_>) {
        log::error!("{msg}");
    }
}

/// In-kernel sink over the debugger print channel.
#[cfg(feature = "kernel")]
#[derive(Clone, Copy, Default)]
pub struct DbgPrintSink;

#[cfg(feature = "kernel")]
impl DiagnosticSink for DbgPrintSink {
    fn info(&self, msg: fmt::Arguments<'_>) {
        wdk::println!("{msg}");
    }

    fn error(&self, msg: fmt::Arguments<'_>) {
        wdk::println!("{msg}");
    }
}
