//! Session store: the owner of the authenticated identity.
//!
//! Every other component reads the identity through this store and never
//! mutates it; a component that observes an invalid token asks for a logout
//! transition via [`SessionStore::request_logout`].
//!
//! Both `login` and `logout` bump a monotonically increasing **generation**.
//! Synchronizers tag their snapshots and in-flight operations with the
//! generation they started under; a mismatch means the identity changed in
//! the meantime and the stale data must be discarded. This is what keeps one
//! user's cart from ever being shown under another user's session, even
//! transiently.
//!
//! Token persistence is not handled here; the embedding app restores a
//! session by calling [`SessionStore::login`] with whatever it stored.

use std::sync::{PoisonError, RwLock};

use tokio::sync::watch;

use quickbite_core::Identity;

use crate::error::{clear_sentry_user, set_sentry_user};

/// Holds the authenticated identity and its change generation.
///
/// Shared as `Arc<SessionStore>` between the synchronizers and the checkout
/// coordinator.
pub struct SessionStore {
    inner: RwLock<SessionState>,
    notify: watch::Sender<u64>,
}

struct SessionState {
    identity: Option<Identity>,
    generation: u64,
}

impl SessionStore {
    /// Create an empty (unauthenticated) session store.
    #[must_use]
    pub fn new() -> Self {
        let (notify, _) = watch::channel(0);
        Self {
            inner: RwLock::new(SessionState {
                identity: None,
                generation: 0,
            }),
            notify,
        }
    }

    /// Current identity, if a session is active.
    #[must_use]
    pub fn identity(&self) -> Option<Identity> {
        self.read().identity.clone()
    }

    /// Current session generation.
    ///
    /// Bumped by every login and logout; snapshots tagged with an older
    /// generation are stale.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.read().generation
    }

    /// Begin a session for `identity`.
    ///
    /// Replacing an existing session counts as an identity change: the
    /// generation is bumped and listeners are notified, so snapshots from
    /// the previous user are invalidated before any new fetch completes.
    pub fn login(&self, identity: Identity) {
        let generation = {
            let mut state = self.write();
            state.generation += 1;
            tracing::info!(user_id = %identity.user_id, "Session started");
            set_sentry_user(&identity.user_id);
            state.identity = Some(identity);
            state.generation
        };
        let _ = self.notify.send(generation);
    }

    /// End the current session, if any.
    ///
    /// A no-op when already logged out, so snapshots are not needlessly
    /// invalidated.
    pub fn logout(&self) {
        let generation = {
            let mut state = self.write();
            if state.identity.is_none() {
                return;
            }
            state.identity = None;
            state.generation += 1;
            clear_sentry_user();
            tracing::info!("Session ended");
            state.generation
        };
        let _ = self.notify.send(generation);
    }

    /// Request a logout transition on behalf of a component that observed
    /// an invalid or expired token.
    ///
    /// Components never clear the identity themselves; this is the single
    /// mutation path.
    pub fn request_logout(&self) {
        tracing::warn!("Logout requested after authentication failure");
        self.logout();
    }

    /// Subscribe to identity changes.
    ///
    /// The receiver yields the new generation after every login/logout; the
    /// UI layer uses it to re-render auth-dependent screens.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.notify.subscribe()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, SessionState> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, SessionState> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickbite_core::{Role, UserId};

    fn customer(id: i64) -> Identity {
        Identity::new(UserId::new(id), Role::Customer, format!("token-{id}"))
    }

    #[test]
    fn test_login_and_logout_bump_generation() {
        let store = SessionStore::new();
        assert_eq!(store.generation(), 0);
        assert!(store.identity().is_none());

        store.login(customer(1));
        assert_eq!(store.generation(), 1);
        assert_eq!(store.identity().map(|i| i.user_id), Some(UserId::new(1)));

        store.logout();
        assert_eq!(store.generation(), 2);
        assert!(store.identity().is_none());
    }

    #[test]
    fn test_relogin_is_an_identity_change() {
        let store = SessionStore::new();
        store.login(customer(1));
        let before = store.generation();

        store.login(customer(2));
        assert!(store.generation() > before);
        assert_eq!(store.identity().map(|i| i.user_id), Some(UserId::new(2)));
    }

    #[test]
    fn test_logout_when_logged_out_is_noop() {
        let store = SessionStore::new();
        store.logout();
        assert_eq!(store.generation(), 0);
    }

    #[test]
    fn test_subscribe_sees_changes() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();
        assert_eq!(*rx.borrow_and_update(), 0);

        store.login(customer(1));
        assert!(rx.has_changed().unwrap_or(false));
        assert_eq!(*rx.borrow_and_update(), 1);
    }
}
