//! Backend payload normalization.
//!
//! Turns whatever the recommendation backend returned into a complete
//! [`RecommendationResponse`]. The mapping is total: every field has a
//! fallback, so no input can make it fail.

use rand::Rng;
use serde_json::Value;

use crate::{
    config::PlaceholderPolicy,
    models::{Movie, RawAnalysis, RawMovie, RawPayload, RecommendationResponse, UserAnalysis},
};

const DEFAULT_EMOTION: &str = "neutral";
const DEFAULT_GENDER: &str = "unknown";
const DEFAULT_AGE: u32 = 25;
const DEFAULT_CONFIDENCE: f64 = 0.85;
/// Legacy payloads report confidence as a percentage
const DEFAULT_LEGACY_CONFIDENCE: f64 = 85.0;
const DEFAULT_MESSAGE: &str = "Analysis complete";

const MOVIE_ID_OFFSET: u64 = 1000;
const DEFAULT_TITLE: &str = "Unknown Title";
const DEFAULT_OVERVIEW: &str = "No overview available.";
const DEFAULT_RELEASE_DATE: &str = "2023-01-01";
const DEFAULT_RATING: f64 = 7.5;
const DEFAULT_GENRE_IDS: [u32; 2] = [18, 35];
const MISSING_POSTER: &str = "N/A";

const PLACEHOLDER_PHOTO_BASE: u64 = 7_991_579;
const POSTER_WIDTH: u32 = 500;
const BACKDROP_WIDTH: u32 = 1200;

const VOTE_COUNT_RANGE: std::ops::Range<u32> = 1000..6000;
const POPULARITY_RANGE: std::ops::Range<f64> = 500.0..1500.0;
const GENRE_ID_RANGE: std::ops::Range<u32> = 10..30;

/// Normalizes backend payloads under a fixed placeholder policy
#[derive(Debug, Clone, Copy, Default)]
pub struct Normalizer {
    policy: PlaceholderPolicy,
}

impl Normalizer {
    pub fn new(policy: PlaceholderPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> PlaceholderPolicy {
        self.policy
    }

    /// Normalizes a raw JSON body using the thread-local RNG
    pub fn normalize(&self, body: &Value) -> RecommendationResponse {
        self.normalize_with_rng(body, &mut rand::thread_rng())
    }

    pub fn normalize_with_rng<R: Rng>(
        &self,
        body: &Value,
        rng: &mut R,
    ) -> RecommendationResponse {
        let payload = RawPayload::from_value(body);

        let (analysis, message) = match &payload {
            RawPayload::Nested {
                analysis, message, ..
            } => (
                nested_analysis(analysis),
                message.clone().unwrap_or_else(|| DEFAULT_MESSAGE.to_string()),
            ),
            RawPayload::Flat { analysis, .. } => {
                (legacy_analysis(analysis), DEFAULT_MESSAGE.to_string())
            }
        };

        let recommendations = payload
            .recommendations()
            .iter()
            .enumerate()
            .map(|(index, raw)| self.movie(index, raw, rng))
            .collect();

        RecommendationResponse {
            analysis,
            recommendations,
            message,
        }
    }

    fn movie<R: Rng>(&self, index: usize, raw: &RawMovie, rng: &mut R) -> Movie {
        let title = raw
            .title
            .clone()
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let poster = raw
            .poster_url
            .as_deref()
            .filter(|url| *url != MISSING_POSTER);
        let (poster_path, backdrop_path) = match poster {
            Some(url) => (url.to_string(), url.replacen("w500", "w1200", 1)),
            None => (
                placeholder_image(index, POSTER_WIDTH),
                placeholder_image(index, BACKDROP_WIDTH),
            ),
        };

        let genre_ids = match raw.genre_count {
            Some(count) => (0..count).map(|_| self.genre_id(rng)).collect(),
            None => DEFAULT_GENRE_IDS.to_vec(),
        };

        Movie {
            id: index as u64 + MOVIE_ID_OFFSET,
            original_title: title.clone(),
            title,
            overview: raw
                .overview
                .clone()
                .unwrap_or_else(|| DEFAULT_OVERVIEW.to_string()),
            poster_path,
            backdrop_path,
            release_date: raw
                .release_date
                .clone()
                .unwrap_or_else(|| DEFAULT_RELEASE_DATE.to_string()),
            vote_average: raw.rating.filter(|r| r.is_finite()).unwrap_or(DEFAULT_RATING),
            vote_count: self.vote_count(rng),
            genre_ids,
            adult: false,
            original_language: "en".to_string(),
            popularity: self.popularity(rng),
            video: false,
        }
    }

    fn vote_count<R: Rng>(&self, rng: &mut R) -> u32 {
        match self.policy {
            PlaceholderPolicy::Randomized => rng.gen_range(VOTE_COUNT_RANGE),
            PlaceholderPolicy::Fixed => VOTE_COUNT_RANGE.start,
        }
    }

    fn popularity<R: Rng>(&self, rng: &mut R) -> f64 {
        match self.policy {
            PlaceholderPolicy::Randomized => rng.gen_range(POPULARITY_RANGE),
            PlaceholderPolicy::Fixed => POPULARITY_RANGE.start,
        }
    }

    fn genre_id<R: Rng>(&self, rng: &mut R) -> u32 {
        match self.policy {
            PlaceholderPolicy::Randomized => rng.gen_range(GENRE_ID_RANGE),
            PlaceholderPolicy::Fixed => GENRE_ID_RANGE.start,
        }
    }
}

/// Analysis from the nested shape: copied with defaults
pub fn nested_analysis(raw: &RawAnalysis) -> UserAnalysis {
    UserAnalysis {
        emotion: raw
            .emotion
            .clone()
            .unwrap_or_else(|| DEFAULT_EMOTION.to_string()),
        gender: raw
            .gender
            .clone()
            .unwrap_or_else(|| DEFAULT_GENDER.to_string()),
        age: age(raw.age),
        confidence: raw
            .confidence
            .filter(|c| *c != 0.0)
            .map(unit_interval)
            .unwrap_or(DEFAULT_CONFIDENCE),
    }
}

/// Analysis from the flat legacy shape
pub fn legacy_analysis(raw: &RawAnalysis) -> UserAnalysis {
    let confidence = raw
        .confidence
        .filter(|c| *c != 0.0)
        .or(raw.emotion_confidence.filter(|c| *c != 0.0))
        .unwrap_or(DEFAULT_LEGACY_CONFIDENCE);

    UserAnalysis {
        emotion: raw
            .emotion
            .as_deref()
            .map(map_emotion)
            .unwrap_or_else(|| DEFAULT_EMOTION.to_string()),
        gender: raw
            .gender
            .as_deref()
            .map(str::to_lowercase)
            .unwrap_or_else(|| DEFAULT_GENDER.to_string()),
        age: age(raw.age),
        confidence: unit_interval(confidence),
    }
}

/// Maps the legacy emotion vocabulary onto the presenter's labels
fn map_emotion(emotion: &str) -> String {
    match emotion.to_lowercase().as_str() {
        "surprise" => "surprised".to_string(),
        other => other.to_string(),
    }
}

fn age(raw: Option<f64>) -> u32 {
    raw.filter(|a| *a >= 1.0)
        .map(|a| a.round().min(u32::MAX as f64) as u32)
        .unwrap_or(DEFAULT_AGE)
}

/// Fractions pass through; larger values are percentages. Exactly `1`
/// reads as a fraction (full confidence), not as 1%.
fn unit_interval(value: f64) -> f64 {
    let fraction = if value > 1.0 { value / 100.0 } else { value };
    fraction.clamp(0.0, 1.0)
}

/// Deterministic stock photo used when the backend has no poster
pub fn placeholder_image(index: usize, width: u32) -> String {
    let photo = PLACEHOLDER_PHOTO_BASE + index as u64;
    format!(
        "https://images.pexels.com/photos/{photo}/pexels-photo-{photo}.jpeg?auto=compress&cs=tinysrgb&w={width}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};
    use serde_json::json;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(7)
    }

    #[test]
    fn test_legacy_flat_payload() {
        let body = json!({
            "emotion": "surprise",
            "gender": "Female",
            "age": 30,
            "confidence": 90
        });

        let result = Normalizer::default().normalize_with_rng(&body, &mut rng());

        assert_eq!(
            result.analysis,
            UserAnalysis {
                emotion: "surprised".to_string(),
                gender: "female".to_string(),
                age: 30,
                confidence: 0.9,
            }
        );
        assert_eq!(result.message, "Analysis complete");
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_legacy_emotion_lowercased_and_confidence_fallbacks() {
        let body = json!({"emotion": "HAPPY", "emotion_confidence": 40});
        let analysis = Normalizer::default().normalize(&body).analysis;
        assert_eq!(analysis.emotion, "happy");
        assert_eq!(analysis.gender, "unknown");
        assert_eq!(analysis.age, 25);
        assert!((analysis.confidence - 0.4).abs() < f64::EPSILON);

        let analysis = Normalizer::default().normalize(&json!({})).analysis;
        assert!((analysis.confidence - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn test_legacy_fractional_confidence_is_not_rescaled() {
        let analysis = Normalizer::default()
            .normalize(&json!({"confidence": 0.62}))
            .analysis;
        assert!((analysis.confidence - 0.62).abs() < f64::EPSILON);
    }

    #[test]
    fn test_legacy_confidence_of_one_is_full_confidence() {
        let one = Normalizer::default()
            .normalize(&json!({"confidence": 1}))
            .analysis;
        assert_eq!(one.confidence, 1.0);

        let just_above = Normalizer::default()
            .normalize(&json!({"confidence": 1.5}))
            .analysis;
        assert!((just_above.confidence - 0.015).abs() < 1e-12);
    }

    #[test]
    fn test_nested_payload_defaults() {
        let body = json!({"analysis": {}, "recommendations": []});
        let result = Normalizer::default().normalize(&body);

        assert_eq!(result.analysis.emotion, "neutral");
        assert_eq!(result.analysis.gender, "unknown");
        assert_eq!(result.analysis.age, 25);
        assert!((result.analysis.confidence - 0.85).abs() < f64::EPSILON);
        assert_eq!(result.message, "Analysis complete");
    }

    #[test]
    fn test_nested_payload_copies_fields() {
        let body = json!({
            "analysis": {"emotion": "sad", "gender": "male", "age": 41.6, "confidence": 0.73},
            "message": "Found 2 movies"
        });
        let result = Normalizer::default().normalize(&body);

        assert_eq!(result.analysis.emotion, "sad");
        assert_eq!(result.analysis.gender, "male");
        assert_eq!(result.analysis.age, 42);
        assert!((result.analysis.confidence - 0.73).abs() < f64::EPSILON);
        assert_eq!(result.message, "Found 2 movies");
    }

    #[test]
    fn test_nested_zero_confidence_uses_default() {
        let body = json!({"analysis": {"emotion": "neutral", "confidence": 0.0}});
        let analysis = Normalizer::default().normalize(&body).analysis;
        assert!((analysis.confidence - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn test_confidence_always_in_unit_interval() {
        for confidence in [-5.0, 0.5, 1.0, 90.0, 250.0] {
            for body in [
                json!({"confidence": confidence}),
                json!({"analysis": {"confidence": confidence}}),
            ] {
                let c = Normalizer::default().normalize(&body).analysis.confidence;
                assert!((0.0..=1.0).contains(&c), "{} normalized to {}", confidence, c);
            }
        }
    }

    #[test]
    fn test_recommendation_count_and_images_preserved() {
        let body = json!({
            "analysis": {"emotion": "happy"},
            "recommendations": [
                {"title": "Paddington 2", "poster_url": "https://image.tmdb.org/t/p/w500/a.jpg"},
                {},
                "not an object",
                {"poster_url": ""}
            ]
        });
        let result = Normalizer::default().normalize(&body);

        assert_eq!(result.recommendations.len(), 4);
        for movie in &result.recommendations {
            assert!(!movie.poster_path.is_empty());
            assert!(!movie.backdrop_path.is_empty());
        }
    }

    #[test]
    fn test_poster_sentinel_uses_index_placeholder() {
        let body = json!({
            "recommendations": [
                {"poster_url": "https://image.tmdb.org/t/p/w500/a.jpg"},
                {"poster_url": "https://image.tmdb.org/t/p/w500/b.jpg"},
                {"poster_url": "N/A"}
            ]
        });
        let result = Normalizer::default().normalize(&body);
        let movie = &result.recommendations[2];

        assert_eq!(
            movie.poster_path,
            "https://images.pexels.com/photos/7991581/pexels-photo-7991581.jpeg?auto=compress&cs=tinysrgb&w=500"
        );
        assert_eq!(movie.backdrop_path, placeholder_image(2, 1200));
    }

    #[test]
    fn test_real_poster_derives_backdrop() {
        let body = json!({
            "recommendations": [{"poster_url": "https://image.tmdb.org/t/p/w500/w500.jpg"}]
        });
        let movie = &Normalizer::default().normalize(&body).recommendations[0];
        assert_eq!(movie.poster_path, "https://image.tmdb.org/t/p/w500/w500.jpg");
        assert_eq!(movie.backdrop_path, "https://image.tmdb.org/t/p/w1200/w500.jpg");
    }

    #[test]
    fn test_movie_fallbacks() {
        let body = json!({"recommendations": [{}, {"title": "Heat", "rating": 8.3, "release_date": "1995-12-15"}]});
        let result = Normalizer::new(PlaceholderPolicy::Fixed).normalize(&body);

        let first = &result.recommendations[0];
        assert_eq!(first.id, 1000);
        assert_eq!(first.title, "Unknown Title");
        assert_eq!(first.original_title, "Unknown Title");
        assert_eq!(first.overview, "No overview available.");
        assert_eq!(first.release_date, "2023-01-01");
        assert_eq!(first.vote_average, 7.5);
        assert_eq!(first.genre_ids, vec![18, 35]);
        assert_eq!(first.original_language, "en");

        let second = &result.recommendations[1];
        assert_eq!(second.id, 1001);
        assert_eq!(second.title, "Heat");
        assert_eq!(second.vote_average, 8.3);
        assert_eq!(second.release_date, "1995-12-15");
    }

    #[test]
    fn test_randomized_placeholders_stay_in_range() {
        let body = json!({"recommendations": [{"genres": ["Drama", "Crime", "Thriller"]}]});
        let movie = &Normalizer::default()
            .normalize_with_rng(&body, &mut rng())
            .recommendations[0];

        assert!(VOTE_COUNT_RANGE.contains(&movie.vote_count));
        assert!(POPULARITY_RANGE.contains(&movie.popularity));
        assert_eq!(movie.genre_ids.len(), 3);
        assert!(movie.genre_ids.iter().all(|id| GENRE_ID_RANGE.contains(id)));
    }

    #[test]
    fn test_fixed_placeholders_are_reproducible() {
        let body = json!({"recommendations": [{"genres": ["Drama"]}]});
        let normalizer = Normalizer::new(PlaceholderPolicy::Fixed);
        let first = normalizer.normalize(&body);
        let second = normalizer.normalize(&body);

        assert_eq!(first, second);
        assert_eq!(first.recommendations[0].vote_count, 1000);
        assert_eq!(first.recommendations[0].popularity, 500.0);
        assert_eq!(first.recommendations[0].genre_ids, vec![10]);
    }

    #[test]
    fn test_analysis_is_idempotent() {
        let bodies = [
            json!({"emotion": "fear", "gender": "MALE", "age": 19, "confidence": 64}),
            json!({"analysis": {"emotion": "happy", "confidence": 0.91}, "recommendations": [{}]}),
        ];
        let normalizer = Normalizer::default();
        for body in bodies {
            assert_eq!(
                normalizer.normalize(&body).analysis,
                normalizer.normalize(&body).analysis
            );
        }
    }

    #[test]
    fn test_total_over_arbitrary_json() {
        let normalizer = Normalizer::default();
        for body in [
            Value::Null,
            json!(true),
            json!("analysis"),
            json!({"analysis": null, "recommendations": {"0": {}}}),
            json!({"age": -4, "gender": 12, "emotion": ["x"]}),
        ] {
            let result = normalizer.normalize(&body);
            assert!(!result.analysis.emotion.is_empty());
            assert!(!result.analysis.gender.is_empty());
            assert!(result.analysis.age > 0);
        }
    }
}
