//! Durable string-keyed storage.
//!
//! [`KvStore`] is the raw text interface a backend implements; [`KvStoreExt`]
//! layers typed JSON get/set on top of any backend. Writes are synchronous and
//! unbuffered: once `set` returns, the value is stored.

mod memory_store;
mod sqlite_store;

pub use memory_store::MemoryStore;
pub use sqlite_store::SqliteStore;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{JotterError, Result};

pub trait KvStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>>;
    fn set_raw(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Typed access over any [`KvStore`].
pub trait KvStoreExt: KvStore {
    /// Decode the value at `key`, or `None` if the key is absent.
    fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.get_raw(key)? {
            Some(text) => serde_json::from_str(&text)
                .map(Some)
                .map_err(|e| JotterError::read(key, e)),
            None => Ok(None),
        }
    }

    /// Decode the value at `key`, falling back to `default` on a miss.
    fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> Result<T> {
        Ok(self.get(key)?.unwrap_or(default))
    }

    /// Decode the value at `key`; a miss is [`JotterError::MissingKey`].
    fn get_required<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        self.get(key)?
            .ok_or_else(|| JotterError::MissingKey(key.to_string()))
    }

    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let text = serde_json::to_string(value).map_err(|e| JotterError::write(key, e))?;
        self.set_raw(key, &text)
    }
}

impl<S: KvStore + ?Sized> KvStoreExt for S {}

impl<S: KvStore + ?Sized> KvStore for std::rc::Rc<S> {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        (**self).get_raw(key)
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        (**self).set_raw(key, value)
    }

    fn remove(&self, key: &str) -> Result<()> {
        (**self).remove(key)
    }
}
