//! Session store: single source of truth for who is logged in.
//!
//! Holds the current user, persists the credential bundle to durable
//! storage, and notifies subscribers synchronously on every change. A
//! subscriber registered after a change immediately receives the latest
//! value (replay-one), never a stale or empty one.

use tracing::debug;

use crate::models::{Session, User};
use crate::storage::LocalStore;

/// Storage keys for the persisted session.
pub const KEY_TOKEN: &str = "token";
pub const KEY_REFRESH_TOKEN: &str = "refreshToken";
pub const KEY_USER: &str = "user";

type Listener = Box<dyn Fn(Option<&User>) + Send>;

pub struct SessionStore {
    storage: LocalStore,
    current: Option<User>,
    listeners: Vec<Listener>,
}

impl SessionStore {
    /// Create a store, hydrating from durable storage. A persisted token and
    /// well-formed user record are trusted without re-validation; anything
    /// partial or malformed is treated as absent.
    pub fn new(storage: LocalStore) -> Self {
        let current = Self::hydrate(&storage);
        Self {
            storage,
            current,
            listeners: Vec::new(),
        }
    }

    fn hydrate(storage: &LocalStore) -> Option<User> {
        let token = storage.get(KEY_TOKEN)?;
        if token.is_empty() {
            return None;
        }
        let raw = storage.get(KEY_USER)?;
        match serde_json::from_str(&raw) {
            Ok(user) => {
                debug!("Hydrated session from storage");
                Some(user)
            }
            Err(e) => {
                debug!(error = %e, "Discarding malformed persisted user record");
                None
            }
        }
    }

    /// Synchronous snapshot of the current user.
    pub fn current(&self) -> Option<&User> {
        self.current.as_ref()
    }

    /// Register a listener. It is invoked immediately with the latest value,
    /// then on every subsequent change, in subscription order.
    pub fn subscribe(&mut self, listener: impl Fn(Option<&User>) + Send + 'static) {
        listener(self.current.as_ref());
        self.listeners.push(Box::new(listener));
    }

    /// Store a session: the user becomes current, the full credential bundle
    /// is persisted, and every subscriber is notified before this returns.
    /// Overwrites any prior session.
    pub fn set(&mut self, session: Session) {
        self.storage.set(KEY_TOKEN, &session.token);
        self.storage.set(KEY_REFRESH_TOKEN, &session.refresh_token);
        match serde_json::to_string(&session.user) {
            Ok(json) => self.storage.set(KEY_USER, &json),
            Err(e) => debug!(error = %e, "Failed to serialize user record"),
        }

        self.current = Some(session.user);
        self.notify();
    }

    /// Remove the persisted session and notify subscribers with `None`.
    /// Idempotent.
    pub fn clear(&mut self) {
        self.storage.remove(KEY_TOKEN);
        self.storage.remove(KEY_REFRESH_TOKEN);
        self.storage.remove(KEY_USER);

        self.current = None;
        self.notify();
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener(self.current.as_ref());
        }
    }

    /// The persisted access token, if any.
    pub fn token(&self) -> Option<String> {
        self.storage.get(KEY_TOKEN)
    }

    /// The persisted refresh token, if any.
    pub fn refresh_token(&self) -> Option<String> {
        self.storage.get(KEY_REFRESH_TOKEN)
    }
}
