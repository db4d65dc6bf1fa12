//! Shared session handle.
//!
//! The controller expects one delivery context. When a platform delivers
//! fixes and permission changes on different threads, every call has to go
//! through one lock so points are accumulated in true acceptance order.

use std::sync::{Arc, Mutex};

use crate::provider::LocationProvider;
use crate::session::SessionController;

/// Cloneable, mutex-guarded [`SessionController`].
pub struct SharedSession<P: LocationProvider> {
    inner: Arc<Mutex<SessionController<P>>>,
}

impl<P: LocationProvider> Clone for SharedSession<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: LocationProvider> SharedSession<P> {
    pub fn new(controller: SessionController<P>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(controller)),
        }
    }

    /// Run `f` with exclusive access to the controller.
    ///
    /// A poisoned lock is recovered: each controller call leaves the session
    /// in a consistent state before returning.
    pub fn with_session<F, R>(&self, f: F) -> R
    where
        F: FnOnce(&mut SessionController<P>) -> R,
    {
        let mut guard = match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("[HikeSession] Recovering poisoned session lock");
                poisoned.into_inner()
            }
        };
        f(&mut guard)
    }
}
