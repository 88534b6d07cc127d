//! Per-request session handles.
//!
//! mortar does not know what a session is backed by. The application plugs in
//! a [`SessionProvider`]; the dispatcher acquires one session per request,
//! hands it to the handler through the [`Context`](crate::Context), and
//! releases it when the context goes out of scope.

use crate::error::Error;

/// A closable handle to a backing data store, owned by one request.
pub trait Session: Send + 'static {
    /// Returns the handle to its store. Called exactly once per session.
    fn close(&mut self);

    /// Whether the store behind this session can serve traffic. Backs
    /// [`health::readiness`](crate::health::readiness).
    fn ready(&self) -> bool {
        true
    }
}

/// No-op session for applications without a backing store.
impl Session for () {
    fn close(&mut self) {}
}

/// Hands out one [`Session`] per request.
pub trait SessionProvider: Send + Sync + 'static {
    type Session: Session;

    fn acquire(&self) -> Result<Self::Session, Error>;
}

/// Any `Fn() -> Result<S, Error>` is a provider:
///
/// ```rust
/// use mortar::{App, Error};
///
/// let app = App::new(|| Ok::<_, Error>(()));
/// ```
impl<F, S> SessionProvider for F
where
    F: Fn() -> Result<S, Error> + Send + Sync + 'static,
    S: Session,
{
    type Session = S;

    fn acquire(&self) -> Result<S, Error> {
        self()
    }
}

/// Owns an acquired session and closes it when dropped.
///
/// Dropping is the only release path, so the session is closed on normal
/// return, early return, unwinding and future cancellation alike.
pub(crate) struct SessionGuard<S: Session> {
    session: S,
}

impl<S: Session> SessionGuard<S> {
    pub(crate) fn new(session: S) -> Self {
        Self { session }
    }

    pub(crate) fn get(&self) -> &S { &self.session }
    pub(crate) fn get_mut(&mut self) -> &mut S { &mut self.session }
}

impl<S: Session> Drop for SessionGuard<S> {
    fn drop(&mut self) {
        self.session.close();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    struct Tracked(Arc<AtomicUsize>);

    impl Session for Tracked {
        fn close(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn guard_closes_once_on_drop() {
        let closed = Arc::new(AtomicUsize::new(0));
        let guard = SessionGuard::new(Tracked(Arc::clone(&closed)));
        assert_eq!(closed.load(Ordering::SeqCst), 0);
        drop(guard);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn guard_closes_during_unwind() {
        let closed = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&closed);
        let result = std::panic::catch_unwind(move || -> u8 {
            let _guard = SessionGuard::new(Tracked(inner));
            panic!("handler failed");
        });
        assert!(result.is_err());
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn closures_are_providers() {
        let provider = || Ok::<_, Error>(());
        assert!(provider.acquire().is_ok());

        let failing = || -> Result<(), Error> { Err(Error::session("pool exhausted")) };
        assert!(matches!(failing.acquire(), Err(Error::Session(_))));
    }
}
