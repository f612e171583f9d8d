use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Movie;

/// Who can see the profile
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProfileVisibility {
    Public,
    Private,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Dark,
    Light,
    Auto,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notifications {
    pub new_releases: bool,
    pub recommendations: bool,
    pub watchlist_updates: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Privacy {
    pub profile_visibility: ProfileVisibility,
    pub show_watch_history: bool,
    pub show_ratings: bool,
}

/// Per-user viewing preferences
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserPreferences {
    pub favorite_genres: Vec<String>,
    pub preferred_languages: Vec<String>,
    /// Maximum content rating, e.g. "PG-13"
    pub content_rating: String,
    pub autoplay: bool,
    pub notifications: Notifications,
    pub privacy: Privacy,
    pub theme: Theme,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self::new()
    }
}

impl UserPreferences {
    /// Creates preferences with the profile defaults
    pub fn new() -> Self {
        Self {
            favorite_genres: vec!["Action".into(), "Drama".into(), "Comedy".into()],
            preferred_languages: vec!["English".into(), "Spanish".into()],
            content_rating: "PG-13".to_string(),
            autoplay: true,
            notifications: Notifications {
                new_releases: true,
                recommendations: true,
                watchlist_updates: false,
            },
            privacy: Privacy {
                profile_visibility: ProfileVisibility::Public,
                show_watch_history: true,
                show_ratings: true,
            },
            theme: Theme::Dark,
        }
    }

    /// Toggles a favorite genre on or off
    pub fn toggle_genre(&mut self, genre: &str) {
        if let Some(pos) = self
            .favorite_genres
            .iter()
            .position(|g| g.eq_ignore_ascii_case(genre))
        {
            self.favorite_genres.remove(pos);
        } else {
            self.favorite_genres.push(genre.to_string());
        }
    }

    /// Toggles a preferred language on or off
    pub fn toggle_language(&mut self, language: &str) {
        if let Some(pos) = self
            .preferred_languages
            .iter()
            .position(|l| l.eq_ignore_ascii_case(language))
        {
            self.preferred_languages.remove(pos);
        } else {
            self.preferred_languages.push(language.to_string());
        }
    }
}

/// A movie the user watched
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchHistoryEntry {
    pub movie: Movie,
    pub watched_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_preferences() {
        let prefs = UserPreferences::new();
        assert_eq!(prefs.content_rating, "PG-13");
        assert_eq!(prefs.theme, Theme::Dark);
        assert!(!prefs.notifications.watchlist_updates);
        assert_eq!(prefs.privacy.profile_visibility, ProfileVisibility::Public);
    }

    #[test]
    fn test_toggle_genre() {
        let mut prefs = UserPreferences::new();
        prefs.toggle_genre("Horror");
        assert!(prefs.favorite_genres.contains(&"Horror".to_string()));
        prefs.toggle_genre("horror");
        assert!(!prefs.favorite_genres.iter().any(|g| g == "Horror"));
    }

    #[test]
    fn test_toggle_language_removes_existing() {
        let mut prefs = UserPreferences::new();
        prefs.toggle_language("Spanish");
        assert_eq!(prefs.preferred_languages, vec!["English".to_string()]);
    }

    #[test]
    fn test_theme_serialization() {
        let json = serde_json::to_string(&Theme::Auto).unwrap();
        assert_eq!(json, "\"auto\"");
        let visibility: ProfileVisibility = serde_json::from_str("\"private\"").unwrap();
        assert_eq!(visibility, ProfileVisibility::Private);
    }
}
