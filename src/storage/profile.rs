use chrono::Utc;
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    error::AppResult,
    models::{Movie, UserPreferences, WatchHistoryEntry},
    storage::{KeyValueStore, StorageKey},
};

/// Preferences, watchlist and watch history of each user
pub struct ProfileStore<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> ProfileStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn preferences(&self, user_id: &str) -> AppResult<UserPreferences> {
        self.load(&StorageKey::Preferences(user_id.to_string()))
    }

    pub fn save_preferences(&self, user_id: &str, preferences: &UserPreferences) -> AppResult<()> {
        self.save(&StorageKey::Preferences(user_id.to_string()), preferences)
    }

    pub fn watchlist(&self, user_id: &str) -> AppResult<Vec<Movie>> {
        self.load(&StorageKey::Watchlist(user_id.to_string()))
    }

    /// Adds a movie unless one with the same id is already listed
    pub fn add_to_watchlist(&self, user_id: &str, movie: Movie) -> AppResult<bool> {
        let key = StorageKey::Watchlist(user_id.to_string());
        let mut watchlist: Vec<Movie> = self.load(&key)?;
        if watchlist.iter().any(|m| m.id == movie.id) {
            return Ok(false);
        }
        watchlist.push(movie);
        self.save(&key, &watchlist)?;
        Ok(true)
    }

    pub fn remove_from_watchlist(&self, user_id: &str, movie_id: u64) -> AppResult<bool> {
        let key = StorageKey::Watchlist(user_id.to_string());
        let mut watchlist: Vec<Movie> = self.load(&key)?;
        let before = watchlist.len();
        watchlist.retain(|m| m.id != movie_id);
        if watchlist.len() == before {
            return Ok(false);
        }
        self.save(&key, &watchlist)?;
        Ok(true)
    }

    /// Watch history, most recent first
    pub fn history(&self, user_id: &str) -> AppResult<Vec<WatchHistoryEntry>> {
        self.load(&StorageKey::History(user_id.to_string()))
    }

    pub fn record_watch(&self, user_id: &str, movie: Movie) -> AppResult<()> {
        let key = StorageKey::History(user_id.to_string());
        let mut history: Vec<WatchHistoryEntry> = self.load(&key)?;
        history.insert(
            0,
            WatchHistoryEntry {
                movie,
                watched_at: Utc::now(),
            },
        );
        self.save(&key, &history)
    }

    pub fn clear_history(&self, user_id: &str) -> AppResult<()> {
        self.store.remove(&StorageKey::History(user_id.to_string()))
    }

    /// Missing or unreadable records fall back to the default value
    fn load<T: DeserializeOwned + Default>(&self, key: &StorageKey) -> AppResult<T> {
        let Some(raw) = self.store.get(key)? else {
            return Ok(T::default());
        };

        match serde_json::from_str(&raw) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "Discarding unreadable profile record");
                Ok(T::default())
            }
        }
    }

    fn save<T: Serialize>(&self, key: &StorageKey, value: &T) -> AppResult<()> {
        let json = serde_json::to_string(value)?;
        self.store.set(key, &json)
    }
}
