//! Persistence of favorited cities.
//!
//! The [`FavoritesStore`] trait is what the coordinator talks to. Favorites are
//! kept in favoriting order and deduplicated by [`City::key`].
//!
//! [`JsonFavoritesStore`] keeps them in a small JSON file and re-reads it on
//! every [`FavoritesStore::list`], so changes made by another screen or another
//! process show up on the next activation. Writes go to a temporary file that is
//! renamed over the target.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use crate::{error::StoreError, model::City};

/// Operations are synchronous and may block on file I/O. The favorites file is
/// small, so callers on a runtime thread invoke them directly.
pub trait FavoritesStore: Send + Sync {
    /// All favorites, oldest first.
    fn list(&self) -> Result<Vec<City>, StoreError>;

    /// Like [`FavoritesStore::list`], but an unreadable store shows as empty.
    fn list_or_empty(&self) -> Vec<City> {
        self.list().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "failed to read favorites, showing none");
            Vec::new()
        })
    }

    /// Adds `city` unless a city with the same identity is already stored.
    /// Returns `true` if it was inserted.
    fn add(&self, city: &City) -> Result<bool, StoreError>;

    /// Removes the city with the same identity as `city`. Returns `true` if one was removed.
    fn remove(&self, city: &City) -> Result<bool, StoreError>;
}

/// On-disk container.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct FavoritesData {
    version: u32,
    #[serde(default)]
    favorites: Vec<FavoriteRecord>,
}

impl Default for FavoritesData {
    fn default() -> Self {
        Self { version: 1, favorites: Vec::new() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FavoriteRecord {
    #[serde(flatten)]
    city: City,
    added_at: DateTime<Utc>,
}

/// JSON file storage for favorites.
///
/// ```json
/// {
///   "version": 1,
///   "favorites": [
///     {
///       "name": "Berlin",
///       "country": "DE",
///       "latitude": 52.52,
///       "longitude": 13.4,
///       "population": 3645000,
///       "added_at": "2024-05-01T09:30:00Z"
///     }
///   ]
/// }
/// ```
pub struct JsonFavoritesStore {
    file_path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFavoritesStore {
    pub fn new(file_path: PathBuf) -> Self {
        tracing::debug!(path = ?file_path, "initializing JSON favorites store");
        Self { file_path, write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load(&self) -> Result<FavoritesData, StoreError> {
        if !self.file_path.exists() {
            return Ok(FavoritesData::default());
        }

        let contents = std::fs::read_to_string(&self.file_path)?;
        let data: FavoritesData = serde_json::from_str(&contents)
            .map_err(|e| StoreError::Corrupt(format!("failed to parse JSON: {e}")))?;

        tracing::trace!(version = data.version, count = data.favorites.len(), "loaded favorites");
        Ok(data)
    }

    fn save(&self, data: &FavoritesData) -> Result<(), StoreError> {
        if let Some(parent) = self.file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(data)
            .map_err(|e| StoreError::Corrupt(format!("failed to serialize JSON: {e}")))?;

        let tmp_path = self.file_path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.file_path)?;

        tracing::debug!(count = data.favorites.len(), "favorites saved");
        Ok(())
    }
}

impl FavoritesStore for JsonFavoritesStore {
    fn list(&self) -> Result<Vec<City>, StoreError> {
        let data = self.load()?;
        Ok(data.favorites.into_iter().map(|r| r.city).collect())
    }

    fn add(&self, city: &City) -> Result<bool, StoreError> {
        let _span = tracing::debug_span!("favorites_add", city = %city.name).entered();
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut data = self.load()?;
        if data.favorites.iter().any(|r| r.city.same_city(city)) {
            tracing::debug!("already a favorite");
            return Ok(false);
        }

        data.favorites.push(FavoriteRecord { city: city.clone(), added_at: Utc::now() });
        self.save(&data)?;
        Ok(true)
    }

    fn remove(&self, city: &City) -> Result<bool, StoreError> {
        let _span = tracing::debug_span!("favorites_remove", city = %city.name).entered();
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let mut data = self.load()?;
        let before = data.favorites.len();
        data.favorites.retain(|r| !r.city.same_city(city));

        if data.favorites.len() == before {
            return Ok(false);
        }

        self.save(&data)?;
        Ok(true)
    }
}

/// Non-persistent store, for hosts that do not want favorites on disk.
#[derive(Debug, Default)]
pub struct MemoryFavoritesStore {
    cities: Mutex<Vec<City>>,
}

impl MemoryFavoritesStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FavoritesStore for MemoryFavoritesStore {
    fn list(&self) -> Result<Vec<City>, StoreError> {
        Ok(self.cities.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn add(&self, city: &City) -> Result<bool, StoreError> {
        let mut cities = self.cities.lock().unwrap_or_else(PoisonError::into_inner);
        if cities.iter().any(|c| c.same_city(city)) {
            return Ok(false);
        }
        cities.push(city.clone());
        Ok(true)
    }

    fn remove(&self, city: &City) -> Result<bool, StoreError> {
        let mut cities = self.cities.lock().unwrap_or_else(PoisonError::into_inner);
        let before = cities.len();
        cities.retain(|c| !c.same_city(city));
        Ok(cities.len() != before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn berlin() -> City {
        City::new("Berlin", "DE", 52.52, 13.4).with_population(3_645_000)
    }

    fn paris() -> City {
        City::new("Paris", "FR", 48.8566, 2.3522)
    }

    fn store_in(dir: &tempfile::TempDir) -> JsonFavoritesStore {
        JsonFavoritesStore::new(dir.path().join("data").join("favorites.json"))
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).list().unwrap().is_empty());
    }

    #[test]
    fn add_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        assert!(store.add(&berlin()).unwrap());
        assert!(!store.add(&berlin()).unwrap());
        assert_eq!(store.list().unwrap().len(), 1);
    }

    #[test]
    fn preserves_favoriting_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);

        store.add(&paris()).unwrap();
        store.add(&berlin()).unwrap();

        let names: Vec<_> = store.list().unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, ["Paris", "Berlin"]);
    }

    #[test]
    fn persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        store_in(&dir).add(&berlin()).unwrap();

        let reopened = store_in(&dir);
        assert_eq!(reopened.list().unwrap(), vec![berlin()]);
    }

    #[test]
    fn remove_matches_by_identity() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.add(&berlin()).unwrap();
        store.add(&paris()).unwrap();

        // Same identity, different country spelling and no population.
        let other_spelling = City::new("Berlin", "Germany", 52.52, 13.4);
        assert!(store.remove(&other_spelling).unwrap());
        assert!(!store.remove(&other_spelling).unwrap());
        assert_eq!(store.list().unwrap(), vec![paris()]);
    }

    #[test]
    fn corrupt_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        std::fs::create_dir_all(store.path().parent().unwrap()).unwrap();
        std::fs::write(store.path(), "not json").unwrap();

        assert!(matches!(store.list(), Err(StoreError::Corrupt(_))));
        assert!(store.list_or_empty().is_empty());
        assert!(store.add(&berlin()).is_err());
    }

    #[test]
    fn list_or_empty_returns_stored_cities() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.add(&paris()).unwrap();

        assert_eq!(store.list_or_empty(), vec![paris()]);
    }

    #[test]
    fn memory_store_dedups() {
        let store = MemoryFavoritesStore::new();
        assert!(store.add(&berlin()).unwrap());
        assert!(!store.add(&berlin()).unwrap());
        assert!(store.remove(&berlin()).unwrap());
        assert!(store.list().unwrap().is_empty());
    }
}
