//! Session token state shared across in-flight exchanges.

use arc_swap::ArcSwap;
use std::sync::Arc;

/// Lock-free cell holding the current session token.
///
/// The empty string means "no session". The cell is read on every exchange
/// and written only by the initialize path, session expiry, and teardown, so
/// it is a pointer swap rather than a mutex: concurrent exchanges never block
/// each other on session state.
pub(crate) struct SessionCell {
    inner: ArcSwap<String>,
}

impl SessionCell {
    pub(crate) fn new() -> Self {
        Self {
            inner: ArcSwap::from_pointee(String::new()),
        }
    }

    /// Snapshot of the current token.
    pub(crate) fn load(&self) -> Arc<String> {
        self.inner.load_full()
    }

    pub(crate) fn store(&self, token: String) {
        self.inner.store(Arc::new(token));
    }

    /// Clear the token only if it is still the snapshot observed earlier.
    ///
    /// A token refreshed by a concurrent exchange is a different snapshot and
    /// stays put.
    pub(crate) fn clear_if(&self, observed: &Arc<String>) {
        self.inner.compare_and_swap(observed, Arc::new(String::new()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_empty() {
        let cell = SessionCell::new();
        assert_eq!(*cell.load(), "");
    }

    #[test]
    fn store_and_load() {
        let cell = SessionCell::new();
        cell.store("sess-1".to_owned());
        assert_eq!(*cell.load(), "sess-1");
    }

    #[test]
    fn clear_if_matches_current_snapshot() {
        let cell = SessionCell::new();
        cell.store("sess-1".to_owned());
        let observed = cell.load();
        cell.clear_if(&observed);
        assert_eq!(*cell.load(), "");
    }

    #[test]
    fn clear_if_ignores_stale_snapshot() {
        let cell = SessionCell::new();
        cell.store("sess-1".to_owned());
        let stale = cell.load();
        // Another exchange refreshed the token in the meantime.
        cell.store("sess-2".to_owned());
        cell.clear_if(&stale);
        assert_eq!(*cell.load(), "sess-2");
    }
}
