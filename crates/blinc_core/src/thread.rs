//! Designated UI thread guard
//!
//! The surface tree and everything built on it is driven from a single UI
//! thread. Types holding `Rc` state are already `!Send`, so most misuse is a
//! compile error; `MainThread` catches the rest (for example an animator
//! created on one thread while another thread owns the tree).

use std::thread::{self, ThreadId};

/// Remembers the thread a component was created on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MainThread {
    id: ThreadId,
}

impl MainThread {
    /// Designate the calling thread as the UI thread
    pub fn current() -> Self {
        Self {
            id: thread::current().id(),
        }
    }

    /// Check whether the caller runs on the designated thread
    pub fn is_current(&self) -> bool {
        thread::current().id() == self.id
    }

    /// Fail fast when called from any other thread
    ///
    /// # Panics
    ///
    /// Panics if the calling thread is not the designated UI thread.
    pub fn assert_current(&self, operation: &str) {
        if !self.is_current() {
            panic!(
                "{} must be called from the UI thread ({:?}), called from {:?}",
                operation,
                self.id,
                thread::current().id()
            );
        }
    }
}
