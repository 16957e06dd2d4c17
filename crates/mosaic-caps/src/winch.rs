#![forbid(unsafe_code)]

//! Terminal-resize notification plumbing.
//!
//! A resize is delivered asynchronously (SIGWINCH) but consumed
//! synchronously: the signal handler only sets a flag, and the render loop
//! polls it between frames. The compositor must re-detect dimensions before
//! the next flush when the flag was set; no flush is skipped because of a
//! pending resize.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// A latch set by SIGWINCH and drained by the render loop.
#[derive(Debug, Clone, Default)]
pub struct ResizeFlag {
    flag: Arc<AtomicBool>,
}

impl ResizeFlag {
    /// Create an unregistered flag (useful for tests and non-tty output).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a flag and register it on SIGWINCH.
    #[cfg(unix)]
    pub fn registered() -> std::io::Result<Self> {
        let this = Self::new();
        signal_hook::flag::register(
            signal_hook::consts::signal::SIGWINCH,
            Arc::clone(&this.flag),
        )?;
        #[cfg(feature = "tracing")]
        tracing::debug!("registered SIGWINCH resize flag");
        Ok(this)
    }

    /// Mark a resize as pending (also what the signal handler does).
    pub fn set(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Consume the pending-resize latch.
    ///
    /// Returns `true` at most once per resize burst; a storm of SIGWINCH
    /// deliveries collapses into a single re-detect.
    pub fn take(&self) -> bool {
        self.flag.swap(false, Ordering::SeqCst)
    }

    /// Peek without consuming.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
