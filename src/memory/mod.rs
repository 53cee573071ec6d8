//! Session context store.
//!
//! Holds, per session id, a bounded window of recent exchanges and a map of
//! user preferences. Contexts live for the lifetime of the process: nothing
//! is written to disk and a restart starts from an empty store.
//!
//! Handlers never touch a global map; they receive a [`ContextStore`]
//! through [`AppState`](crate::AppState).

mod window;

pub use window::HistoryWindow;

use crate::types::Exchange;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Default number of exchanges kept per session.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Conversation context for one session.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub history: HistoryWindow,
    pub preferences: Map<String, Value>,
}

impl SessionContext {
    pub fn new(history_limit: usize) -> Self {
        Self {
            history: HistoryWindow::new(history_limit),
            preferences: Map::new(),
        }
    }
}

/// Storage for session contexts.
///
/// Every mutating call is atomic with respect to other calls for the same
/// session, so two concurrent relays for one session cannot drop each
/// other's exchange.
pub trait ContextStore: Send + Sync {
    /// Returns the stored context, or a fresh empty one without storing it.
    fn get(&self, session_id: &str) -> SessionContext;

    /// Returns the stored context only if one was ever written.
    fn lookup(&self, session_id: &str) -> Option<SessionContext>;

    /// Appends an exchange, evicting the oldest beyond the history limit.
    fn append(&self, session_id: &str, exchange: Exchange);

    /// Merges preference values into the session, overwriting existing keys.
    fn merge_preferences(&self, session_id: &str, preferences: Map<String, Value>);

    /// Removes the session. Returns whether anything was removed.
    fn clear(&self, session_id: &str) -> bool;

    /// Stored session ids with their history sizes, sorted by id.
    fn sessions(&self) -> Vec<(String, usize)>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Process-local [`ContextStore`] backed by a locked `HashMap`.
pub struct InMemoryContextStore {
    history_limit: usize,
    contexts: RwLock<HashMap<String, SessionContext>>,
}

impl InMemoryContextStore {
    pub fn new(history_limit: usize) -> Self {
        Self {
            history_limit,
            contexts: RwLock::new(HashMap::new()),
        }
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }
}

impl Default for InMemoryContextStore {
    fn default() -> Self {
        Self::new(DEFAULT_HISTORY_LIMIT)
    }
}

impl ContextStore for InMemoryContextStore {
    fn get(&self, session_id: &str) -> SessionContext {
        self.lookup(session_id)
            .unwrap_or_else(|| SessionContext::new(self.history_limit))
    }

    fn lookup(&self, session_id: &str) -> Option<SessionContext> {
        self.contexts.read().get(session_id).cloned()
    }

    fn append(&self, session_id: &str, exchange: Exchange) {
        let mut contexts = self.contexts.write();
        contexts
            .entry(session_id.to_string())
            .or_insert_with(|| SessionContext::new(self.history_limit))
            .history
            .push(exchange);
    }

    fn merge_preferences(&self, session_id: &str, preferences: Map<String, Value>) {
        if preferences.is_empty() {
            return;
        }
        let mut contexts = self.contexts.write();
        let context = contexts
            .entry(session_id.to_string())
            .or_insert_with(|| SessionContext::new(self.history_limit));
        context.preferences.extend(preferences);
    }

    fn clear(&self, session_id: &str) -> bool {
        self.contexts.write().remove(session_id).is_some()
    }

    fn sessions(&self) -> Vec<(String, usize)> {
        let mut sessions: Vec<_> = self
            .contexts
            .read()
            .iter()
            .map(|(id, ctx)| (id.clone(), ctx.history.len()))
            .collect();
        sessions.sort();
        sessions
    }

    fn len(&self) -> usize {
        self.contexts.read().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_get_does_not_persist_empty_context() {
        let store = InMemoryContextStore::default();
        let ctx = store.get("fresh");
        assert!(ctx.history.is_empty());
        assert!(ctx.preferences.is_empty());
        assert!(store.lookup("fresh").is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn test_history_is_capped_at_limit() {
        let store = InMemoryContextStore::default();
        for n in 1..=25 {
            store.append("s", Exchange::new(format!("q{}", n), format!("a{}", n)));
            let ctx = store.lookup("s").unwrap();
            assert_eq!(ctx.history.len(), n.min(DEFAULT_HISTORY_LIMIT));
        }

        let users: Vec<String> = store
            .lookup("s")
            .unwrap()
            .history
            .iter()
            .map(|e| e.user.clone())
            .collect();
        let expected: Vec<String> = (16..=25).map(|n| format!("q{}", n)).collect();
        assert_eq!(users, expected);
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = InMemoryContextStore::default();
        store.append("s", Exchange::new("hi", "hello"));

        assert!(store.clear("s"));
        assert!(!store.clear("s"));
        assert!(!store.clear("never-seen"));
        assert!(store.lookup("s").is_none());
        assert!(store.lookup("never-seen").is_none());
    }

    #[test]
    fn test_merge_preferences_overwrites_keys() {
        let store = InMemoryContextStore::default();
        let mut first = Map::new();
        first.insert("branch".into(), json!("mechanical"));
        first.insert("year".into(), json!(2025));
        store.merge_preferences("s", first);

        let mut second = Map::new();
        second.insert("branch".into(), json!("civil"));
        store.merge_preferences("s", second);

        let ctx = store.lookup("s").unwrap();
        assert_eq!(ctx.preferences["branch"], json!("civil"));
        assert_eq!(ctx.preferences["year"], json!(2025));
        assert!(ctx.history.is_empty());
    }

    #[test]
    fn test_empty_preferences_do_not_create_session() {
        let store = InMemoryContextStore::default();
        store.merge_preferences("s", Map::new());
        assert!(store.lookup("s").is_none());
    }

    #[test]
    fn test_sessions_listing_is_sorted() {
        let store = InMemoryContextStore::new(5);
        store.append("b", Exchange::new("1", "1"));
        store.append("a", Exchange::new("1", "1"));
        store.append("a", Exchange::new("2", "2"));

        assert_eq!(
            store.sessions(),
            vec![("a".to_string(), 2), ("b".to_string(), 1)]
        );
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_concurrent_appends_are_not_lost() {
        let store = Arc::new(InMemoryContextStore::new(1000));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        store.append("shared", Exchange::new(format!("{}-{}", t, i), "ok"));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.lookup("shared").unwrap().history.len(), 400);
    }
}
