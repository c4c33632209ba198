pub mod json_store;
pub mod memory_store;
pub mod schema;

use anyhow::Result;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Opaque string-keyed store for serialized player data.
pub trait KeyValueStore {
    fn load(&self, key: &str) -> Option<String>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// Missing, unreadable and unparsable values all fall back to the default.
pub fn load_or_default<T: DeserializeOwned + Default>(store: &dyn KeyValueStore, key: &str) -> T {
    let Some(raw) = store.load(key) else {
        return T::default();
    };
    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(key, error = %e, "discarding unreadable stored value");
            T::default()
        }
    }
}

/// Player data is not critical: a failed write is logged and dropped.
pub fn save_best_effort<T: Serialize>(store: &dyn KeyValueStore, key: &str, value: &T) {
    let result = serde_json::to_string_pretty(value)
        .map_err(anyhow::Error::from)
        .and_then(|json| store.save(key, &json));
    if let Err(e) = result {
        tracing::warn!(key, error = %e, "failed to persist value");
    }
}
