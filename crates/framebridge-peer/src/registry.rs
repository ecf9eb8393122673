//! Name-to-handler table for remotely invocable operations.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use framebridge_envelope::{is_private, Arguments, RETURN_OPERATION};
use serde_json::Value;
use tracing::debug;

use crate::bridge::Bridge;
use crate::error::{PeerError, Result};
use crate::storage::StorageItem;

/// A locally registered operation. A `Some` result is sent back to the
/// caller as a `return` envelope.
pub type Handler = Rc<dyn Fn(&mut Bridge, Arguments) -> Option<Value>>;

pub const ON_READY: &str = "onReady";
pub const ENTER_FULL_BROWSER: &str = "enterFullBrowser";
pub const CANCEL_FULL_BROWSER: &str = "cancelFullBrowser";
pub const ENTER_FULL_SCREEN: &str = "enterFullScreen";
pub const CANCEL_FULL_SCREEN: &str = "cancelFullScreen";
pub const SET_STORAGE_ITEM: &str = "setLocalStorageItem";
pub const SET_STORAGE_ITEMS: &str = "setLocalStorageItems";
pub const GET_STORAGE_ITEM: &str = "getLocalStorageItem";
pub const GET_STORAGE_ITEMS: &str = "getLocalStorageItems";
pub const SET_LOCATION: &str = "setLocation";
pub const GET_LOCATION: &str = "getLocation";
pub const GET_REFERRER: &str = "getReferrer";

/// Operations every bridge exposes.
#[derive(Clone, Default)]
pub struct OperationRegistry {
    handlers: BTreeMap<String, Handler>,
}

impl OperationRegistry {
    /// A registry with nothing registered.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A registry holding the built-in operations.
    pub fn with_builtins() -> Self {
        let mut registry = Self::empty();
        registry.install_builtins();
        registry
    }

    /// Register `handler` under `name`.
    ///
    /// Names carrying the private marker, the reserved `return` name and
    /// names already taken are refused.
    pub fn register<F>(&mut self, name: &str, handler: F) -> Result<()>
    where
        F: Fn(&mut Bridge, Arguments) -> Option<Value> + 'static,
    {
        if is_private(name) {
            return Err(PeerError::PrivateOperation(name.to_string()));
        }
        if name.is_empty() || name == RETURN_OPERATION {
            return Err(PeerError::ReservedOperation(name.to_string()));
        }
        if self.handlers.contains_key(name) {
            return Err(PeerError::DuplicateOperation(name.to_string()));
        }
        self.handlers.insert(name.to_string(), Rc::new(handler));
        Ok(())
    }

    /// Handler for `name`, if it is registered and remotely invocable.
    pub fn get(&self, name: &str) -> Option<Handler> {
        if is_private(name) {
            return None;
        }
        self.handlers.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        self.handlers.keys().map(String::as_str).collect()
    }

    fn builtin<F>(&mut self, name: &'static str, handler: F)
    where
        F: Fn(&mut Bridge, Arguments) -> Option<Value> + 'static,
    {
        self.handlers.insert(name.to_string(), Rc::new(handler));
    }

    fn install_builtins(&mut self) {
        self.builtin(ON_READY, |bridge, args| {
            match (args.str(0), args.str(1)) {
                (Some(instance_id), Some(class_name)) => bridge.on_ready(instance_id, class_name),
                _ => debug!("onReady without instance identity"),
            }
            None
        });
        self.builtin(ENTER_FULL_BROWSER, |bridge, _| {
            Some(Value::Bool(bridge.enter_full_browser()))
        });
        self.builtin(CANCEL_FULL_BROWSER, |bridge, _| {
            Some(Value::Bool(bridge.cancel_full_browser()))
        });
        self.builtin(ENTER_FULL_SCREEN, |bridge, _| {
            Some(Value::Bool(bridge.enter_full_screen()))
        });
        self.builtin(CANCEL_FULL_SCREEN, |bridge, _| {
            Some(Value::Bool(bridge.cancel_full_screen()))
        });
        self.builtin(SET_STORAGE_ITEM, |bridge, args| {
            let Some(key) = args.str(0) else {
                debug!("setLocalStorageItem without a string key");
                return None;
            };
            let value = args.get(1).cloned().unwrap_or(Value::Null);
            bridge.set_local_storage_item(key, &value);
            None
        });
        self.builtin(SET_STORAGE_ITEMS, |bridge, args| {
            let items = args
                .get(0)
                .cloned()
                .map(serde_json::from_value::<Vec<StorageItem>>);
            match items {
                Some(Ok(items)) => bridge.set_local_storage_items(&items),
                Some(Err(err)) => debug!(error = %err, "malformed storage snapshot"),
                None => debug!("setLocalStorageItems without items"),
            }
            None
        });
        self.builtin(GET_STORAGE_ITEM, |bridge, args| {
            let key = args.str(0)?;
            Some(bridge.local_storage_item(key).unwrap_or(Value::Null))
        });
        self.builtin(GET_STORAGE_ITEMS, |bridge, _| {
            serde_json::to_value(bridge.local_storage_items()).ok()
        });
        self.builtin(SET_LOCATION, |bridge, args| {
            match args.str(0) {
                Some(url) => bridge.set_location(url),
                None => debug!("setLocation without a url"),
            }
            None
        });
        self.builtin(GET_LOCATION, |bridge, _| {
            Some(Value::String(bridge.location()))
        });
        self.builtin(GET_REFERRER, |bridge, _| {
            Some(Value::String(bridge.referrer()))
        });
    }
}

impl fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("operations", &self.names())
            .finish()
    }
}
