//! Account ID table and auth table (spec.md §3, §5 "Shared state").

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

/// Maps account name -> small nonnegative integer, assigned in insertion
/// order. IDs are stable for process lifetime and injective; the table only
/// grows, never shrinks.
#[derive(Default)]
pub struct AccountIdTable {
    inner: Mutex<Inner>,
}

#[derive(Default)]
struct Inner {
    ids: HashMap<String, usize>,
    next: usize,
}

impl AccountIdTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Looks up `account`'s integer ID, assigning the next free one if this
    /// is the first time it's been seen.
    pub fn lookup_or_insert(&self, account: &str) -> usize {
        let mut inner = self.inner.lock().expect("account id table poisoned");
        if let Some(&id) = inner.ids.get(account) {
            return id;
        }
        let id = inner.next;
        inner.next += 1;
        inner.ids.insert(account.to_owned(), id);
        id
    }

    /// Looks up `account`'s integer ID without assigning one. Used to answer
    /// `__ACC_FROM_ID__`'s inverse (id -> account) lookups by the hub's
    /// caller, which holds the forward mapping for the reverse scan.
    #[must_use]
    pub fn get(&self, account: &str) -> Option<usize> {
        let inner = self.inner.lock().expect("account id table poisoned");
        inner.ids.get(account).copied()
    }
}

/// Maps account name -> API key, populated once at startup from an optional
/// auth file. Immutable after construction (spec.md §5).
#[derive(Debug, Clone, Default)]
pub struct AuthTable {
    keys: HashMap<String, String>,
    enabled: bool,
}

impl AuthTable {
    /// No auth file configured: every auth check is disabled.
    #[must_use]
    pub fn disabled() -> Self {
        Self { keys: HashMap::new(), enabled: false }
    }

    /// Loads a JSON object mapping account name directly to API key, e.g.
    /// `{"BOB": "key-one", "ALICE": "key-two"}`.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let keys: HashMap<String, String> = serde_json::from_str(&raw)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        Ok(Self { keys, enabled: true })
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// `true` if auth is disabled, or `account` exists with a matching key.
    #[must_use]
    pub fn verify(&self, account: &str, supplied_key: &str) -> bool {
        if !self.enabled {
            return true;
        }
        self.keys.get(account).is_some_and(|key| key == supplied_key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assigns_ids_in_insertion_order_and_is_stable() {
        let table = AccountIdTable::new();
        assert_eq!(table.lookup_or_insert("BOB"), 0);
        assert_eq!(table.lookup_or_insert("ALICE"), 1);
        assert_eq!(table.lookup_or_insert("BOB"), 0);
        assert_eq!(table.get("ALICE"), Some(1));
        assert_eq!(table.get("CAROL"), None);
    }

    #[test]
    fn disabled_auth_table_accepts_anything() {
        let table = AuthTable::disabled();
        assert!(table.verify("BOB", "anything"));
        assert!(!table.is_enabled());
    }

    #[test]
    fn enabled_auth_table_checks_key() {
        let mut keys = HashMap::new();
        keys.insert("BOB".to_owned(), "secret".to_owned());
        let table = AuthTable { keys, enabled: true };
        assert!(table.verify("BOB", "secret"));
        assert!(!table.verify("BOB", "wrong"));
        assert!(!table.verify("UNKNOWN", "secret"));
    }
}
