//! Cooperative cancellation.
//! A `CancelToken` is a one-way "stop" flag shared between the ctrlc handler
//! and every in-flight transfer of a batch.
//!
//! Notes:
//! - Relaxed atomics are sufficient for a one-way flag.
//! - `request()` is safe to call from signal handlers.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request a cooperative stop (idempotent).
    #[inline]
    pub fn request(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    #[inline]
    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_the_flag() {
        let a = CancelToken::new();
        let b = a.clone();
        assert!(!b.is_requested());
        a.request();
        a.request();
        assert!(b.is_requested());
    }
}
