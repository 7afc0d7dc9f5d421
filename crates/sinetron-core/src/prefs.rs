//! Durable player preferences
//!
//! The hosting environment supplies the actual key-value store
//! (`localStorage` in a browser, a config file on desktop); the session
//! reads and writes the volume preference through this seam only.

use std::collections::HashMap;

use tracing::debug;

/// Storage key for the persisted volume preference
pub const VOLUME_KEY: &str = "playerVolume";

/// Minimal durable key-value store
pub trait PreferenceStore {
    fn read(&self, key: &str) -> Option<String>;
    fn write(&mut self, key: &str, value: &str);
}

/// Read the persisted volume, clamped to `[0.0, 1.0]`
pub fn load_volume(store: &dyn PreferenceStore) -> Option<f64> {
    let raw = store.read(VOLUME_KEY)?;
    match raw.parse::<f64>() {
        Ok(volume) => Some(volume.clamp(0.0, 1.0)),
        Err(_) => {
            debug!(%raw, "ignoring unparsable volume preference");
            None
        }
    }
}

/// Persist the volume preference
pub fn save_volume(store: &mut dyn PreferenceStore, volume: f64) {
    store.write(VOLUME_KEY, &volume.clamp(0.0, 1.0).to_string());
}

/// In-memory store for tests and headless hosts
#[derive(Debug, Default)]
pub struct MemoryPrefs(HashMap<String, String>);

impl MemoryPrefs {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPrefs {
    fn read(&self, key: &str) -> Option<String> {
        self.0.get(key).cloned()
    }

    fn write(&mut self, key: &str, value: &str) {
        self.0.insert(key.to_string(), value.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_volume_round_trip() {
        let mut store = MemoryPrefs::new();
        save_volume(&mut store, 0.35);
        assert_eq!(load_volume(&store), Some(0.35));
    }

    #[test]
    fn test_volume_clamped_on_save_and_load() {
        let mut store = MemoryPrefs::new();
        save_volume(&mut store, 2.5);
        assert_eq!(load_volume(&store), Some(1.0));

        store.write(VOLUME_KEY, "-0.4");
        assert_eq!(load_volume(&store), Some(0.0));
    }

    #[test]
    fn test_unparsable_volume_ignored() {
        let mut store = MemoryPrefs::new();
        store.write(VOLUME_KEY, "loud");
        assert_eq!(load_volume(&store), None);
    }

    #[test]
    fn test_missing_volume_absent() {
        assert_eq!(load_volume(&MemoryPrefs::new()), None);
    }
}
