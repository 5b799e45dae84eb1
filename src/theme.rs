//! Theme preference, persisted alongside the session state.

use crate::storage::LocalStore;

/// Storage key for the persisted theme.
pub const KEY_THEME: &str = "theme";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "light" => Some(ThemeMode::Light),
            "dark" => Some(ThemeMode::Dark),
            _ => None,
        }
    }
}

type Listener = Box<dyn Fn(ThemeMode) + Send>;

pub struct ThemePreference {
    storage: LocalStore,
    current: ThemeMode,
    listeners: Vec<Listener>,
}

impl ThemePreference {
    /// Load the stored preference. Anything unrecognized falls back to light.
    pub fn new(storage: LocalStore) -> Self {
        let current = storage
            .get(KEY_THEME)
            .and_then(|v| ThemeMode::parse(&v))
            .unwrap_or_default();
        Self {
            storage,
            current,
            listeners: Vec::new(),
        }
    }

    pub fn current(&self) -> ThemeMode {
        self.current
    }

    /// Register a listener. It is invoked immediately with the current mode,
    /// then on every subsequent change, in subscription order.
    pub fn subscribe(&mut self, listener: impl Fn(ThemeMode) + Send + 'static) {
        listener(self.current);
        self.listeners.push(Box::new(listener));
    }

    pub fn set(&mut self, mode: ThemeMode) {
        self.current = mode;
        self.storage.set(KEY_THEME, mode.as_str());
        for listener in &self.listeners {
            listener(mode);
        }
    }

    /// Flip between light and dark, persisting the result.
    pub fn toggle(&mut self) -> ThemeMode {
        let next = match self.current {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        };
        self.set(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_round_trips_through_storage() {
        let storage = LocalStore::in_memory();
        let mut pref = ThemePreference::new(storage.clone());
        assert_eq!(pref.current(), ThemeMode::Light);

        pref.toggle();
        assert_eq!(pref.current(), ThemeMode::Dark);
        assert_eq!(storage.get(KEY_THEME).as_deref(), Some("dark"));

        let reloaded = ThemePreference::new(storage);
        assert_eq!(reloaded.current(), ThemeMode::Dark);
    }

    #[test]
    fn subscribers_get_replay_then_changes() {
        use std::sync::{Arc, Mutex};

        let mut pref = ThemePreference::new(LocalStore::in_memory());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        pref.subscribe(move |mode| sink.lock().unwrap().push(mode));

        // Current value replayed on subscribe.
        assert_eq!(seen.lock().unwrap().as_slice(), &[ThemeMode::Light]);

        pref.toggle();
        assert_eq!(
            seen.lock().unwrap().as_slice(),
            &[ThemeMode::Light, ThemeMode::Dark]
        );
    }

    #[test]
    fn garbage_falls_back_to_light() {
        let storage = LocalStore::in_memory();
        storage.set(KEY_THEME, "neon");
        let pref = ThemePreference::new(storage);
        assert_eq!(pref.current(), ThemeMode::Light);
    }
}
