//! Local key-value store access with an in-memory fallback.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::error::StorageError;

/// A page-local string store (`localStorage` in a browser).
pub trait KeyValueStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError>;
    /// Every stored pair, in store order.
    fn items(&self) -> Result<Vec<(String, String)>, StorageError>;
}

/// A stored pair as exchanged with the peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageItem {
    pub key: String,
    pub value: Value,
}

/// String store backed by a shared map. Clones see the same contents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    items: Rc<RefCell<BTreeMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored string for `key`.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.items.borrow().get(key).cloned()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.items.borrow().get(key).cloned())
    }

    fn set_item(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
        self.items
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn items(&self) -> Result<Vec<(String, String)>, StorageError> {
        Ok(self
            .items
            .borrow()
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

/// JSON view over a [`KeyValueStore`].
///
/// Values are JSON round-tripped except under the reserved prefix, where
/// they are stored and returned as the exact input string. If the backend
/// fails, the mirror switches to an in-memory map for the rest of its life.
pub struct StorageMirror {
    backend: Option<Box<dyn KeyValueStore>>,
    fallback: MemoryStore,
    reserved_prefix: String,
}

impl StorageMirror {
    pub fn new(backend: Option<Box<dyn KeyValueStore>>, reserved_prefix: impl Into<String>) -> Self {
        Self {
            backend,
            fallback: MemoryStore::new(),
            reserved_prefix: reserved_prefix.into(),
        }
    }

    /// Returns true if `key` holds an opaque string.
    pub fn is_reserved(&self, key: &str) -> bool {
        !self.reserved_prefix.is_empty() && key.starts_with(&self.reserved_prefix)
    }

    /// Returns true once the in-memory map is in use.
    pub fn is_fallback(&self) -> bool {
        self.backend.is_none()
    }

    pub fn set(&mut self, key: &str, value: &Value) {
        let encoded = if self.is_reserved(key) {
            match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            }
        } else {
            match serde_json::to_string(value) {
                Ok(encoded) => encoded,
                Err(err) => {
                    warn!(key, error = %err, "failed to encode storage value");
                    return;
                }
            }
        };

        if let Some(backend) = self.backend.as_mut() {
            match backend.set_item(key, &encoded) {
                Ok(()) => return,
                Err(err) => self.fall_back(err),
            }
        }
        let _ = self.fallback.set_item(key, &encoded);
    }

    pub fn get(&mut self, key: &str) -> Option<Value> {
        let raw = match self.backend.as_ref().map(|backend| backend.get_item(key)) {
            Some(Ok(raw)) => raw,
            Some(Err(err)) => {
                self.fall_back(err);
                self.fallback.raw(key)
            }
            None => self.fallback.raw(key),
        }?;
        if self.is_reserved(key) {
            Some(Value::String(raw))
        } else {
            Some(decode_json(raw))
        }
    }

    /// Every stored pair, decoded.
    pub fn items(&mut self) -> Vec<StorageItem> {
        let raw = match self.backend.as_ref().map(|backend| backend.items()) {
            Some(Ok(items)) => items,
            Some(Err(err)) => {
                self.fall_back(err);
                self.fallback.items().unwrap_or_default()
            }
            None => self.fallback.items().unwrap_or_default(),
        };
        raw.into_iter()
            .map(|(key, value)| {
                let value = if self.is_reserved(&key) {
                    Value::String(value)
                } else {
                    decode_json(value)
                };
                StorageItem { key, value }
            })
            .collect()
    }

    fn fall_back(&mut self, err: StorageError) {
        warn!(error = %err, "local storage unavailable, using in-memory fallback");
        self.backend = None;
    }
}

fn decode_json(raw: String) -> Value {
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(_) => Value::String(raw),
    }
}

impl fmt::Debug for StorageMirror {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StorageMirror")
            .field("fallback", &self.is_fallback())
            .field("reserved_prefix", &self.reserved_prefix)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct BrokenStore;

    impl KeyValueStore for BrokenStore {
        fn get_item(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(StorageError::Unavailable("sandboxed".to_string()))
        }

        fn set_item(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(StorageError::QuotaExceeded)
        }

        fn items(&self) -> Result<Vec<(String, String)>, StorageError> {
            Err(StorageError::Unavailable("sandboxed".to_string()))
        }
    }

    fn mirror(store: &MemoryStore) -> StorageMirror {
        StorageMirror::new(Some(Box::new(store.clone())), "token:")
    }

    #[test]
    fn json_values_round_trip() {
        let store = MemoryStore::new();
        let mut mirror = mirror(&store);
        let values = [
            json!({"volume": 0.4, "muted": false}),
            json!([1, "two", null]),
            json!("plain text"),
            json!(17),
            json!(null),
        ];
        for (n, value) in values.iter().enumerate() {
            let key = format!("k{n}");
            mirror.set(&key, value);
            assert_eq!(mirror.get(&key).as_ref(), Some(value));
        }
        assert_eq!(store.raw("k2").as_deref(), Some("\"plain text\""));
    }

    #[test]
    fn reserved_keys_store_exact_strings() {
        let store = MemoryStore::new();
        let mut mirror = mirror(&store);
        mirror.set("token:session", &json!("{not json"));
        assert_eq!(store.raw("token:session").as_deref(), Some("{not json"));
        assert_eq!(mirror.get("token:session"), Some(json!("{not json")));

        mirror.set("token:number", &json!("42"));
        assert_eq!(mirror.get("token:number"), Some(json!("42")));
    }

    #[test]
    fn missing_key_is_absent() {
        let store = MemoryStore::new();
        assert_eq!(mirror(&store).get("nope"), None);
    }

    #[test]
    fn non_json_raw_values_come_back_as_strings() {
        let mut store = MemoryStore::new();
        store.set_item("legacy", "not-json").unwrap();
        assert_eq!(mirror(&store).get("legacy"), Some(json!("not-json")));
    }

    #[test]
    fn items_decode_each_pair() {
        let store = MemoryStore::new();
        let mut mirror = mirror(&store);
        mirror.set("a", &json!({"x": 1}));
        mirror.set("token:t", &json!("[raw"));
        assert_eq!(
            mirror.items(),
            vec![
                StorageItem {
                    key: "a".to_string(),
                    value: json!({"x": 1}),
                },
                StorageItem {
                    key: "token:t".to_string(),
                    value: json!("[raw"),
                },
            ]
        );
    }

    #[test]
    fn broken_backend_falls_back_transparently() {
        let mut mirror = StorageMirror::new(Some(Box::new(BrokenStore)), "token:");
        mirror.set("k", &json!({"v": true}));
        assert!(mirror.is_fallback());
        assert_eq!(mirror.get("k"), Some(json!({"v": true})));
        assert_eq!(mirror.items().len(), 1);
    }

    #[test]
    fn no_backend_uses_memory() {
        let mut mirror = StorageMirror::new(None, "token:");
        mirror.set("k", &json!(3));
        assert_eq!(mirror.get("k"), Some(json!(3)));
    }
}
