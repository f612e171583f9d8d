use serde::{Deserialize, Serialize};
use std::fmt::Display;
use uuid::Uuid;

pub mod progress;
pub mod raw;
pub mod user_preferences;

pub use progress::{UploadProgress, UploadStatus};
pub use raw::{RawAnalysis, RawMovie, RawPayload};
pub use user_preferences::{
    Notifications, Privacy, ProfileVisibility, Theme, UserPreferences, WatchHistoryEntry,
};

/// Identifier assigned to every pipeline run, carried in its tracing span
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunId(pub Uuid);

impl RunId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Backend-derived emotion/gender/age/confidence tuple for one capture
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAnalysis {
    pub emotion: String,
    pub gender: String,
    pub age: u32,
    /// Always within `[0, 1]`
    pub confidence: f64,
}

impl UserAnalysis {
    /// Emoji used when presenting the detected emotion
    pub fn emotion_emoji(&self) -> &'static str {
        match self.emotion.as_str() {
            "happy" => "😊",
            "sad" => "😢",
            "angry" => "😠",
            "surprised" => "😲",
            "fear" => "😨",
            "disgust" => "🤢",
            _ => "😐",
        }
    }
}

/// A recommended movie in the catalog shape the presenter expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub poster_path: String,
    #[serde(default)]
    pub backdrop_path: String,
    #[serde(default)]
    pub release_date: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default)]
    pub vote_count: u32,
    #[serde(default)]
    pub genre_ids: Vec<u32>,
    #[serde(default)]
    pub adult: bool,
    #[serde(default)]
    pub original_language: String,
    #[serde(default)]
    pub original_title: String,
    #[serde(default)]
    pub popularity: f64,
    #[serde(default)]
    pub video: bool,
}

/// Canonical result of one completed pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub analysis: UserAnalysis,
    pub recommendations: Vec<Movie>,
    pub message: String,
}
