//! Loosely-typed backend payloads.
//!
//! The recommendation backend answers in one of two shapes: the current one
//! nests the analysis under an `analysis` object, the legacy one puts
//! `emotion`/`gender`/`age`/`confidence` at the top level. Both are resolved
//! into [`RawPayload`] with field extraction that never fails; wrong types
//! are treated as absent.

use serde_json::{Map, Value};

/// Backend response resolved into one of its two known shapes
#[derive(Debug, Clone, PartialEq)]
pub enum RawPayload {
    Nested {
        analysis: RawAnalysis,
        recommendations: Vec<RawMovie>,
        message: Option<String>,
    },
    Flat {
        analysis: RawAnalysis,
        recommendations: Vec<RawMovie>,
    },
}

/// Analysis fields as the backend sent them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawAnalysis {
    pub emotion: Option<String>,
    pub gender: Option<String>,
    pub age: Option<f64>,
    pub confidence: Option<f64>,
    /// Legacy alias for `confidence`
    pub emotion_confidence: Option<f64>,
}

/// One recommendation record as the backend sent it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawMovie {
    pub title: Option<String>,
    pub overview: Option<String>,
    pub poster_url: Option<String>,
    pub release_date: Option<String>,
    pub rating: Option<f64>,
    /// Number of genre names supplied, if the field was present at all
    pub genre_count: Option<usize>,
}

impl RawPayload {
    /// Detect the payload shape. Anything without an `analysis` object,
    /// including non-object JSON, is treated as the flat legacy shape.
    pub fn from_value(value: &Value) -> Self {
        let empty = Map::new();
        let root = value.as_object().unwrap_or(&empty);
        let recommendations = recommendations(root);

        match root.get("analysis").and_then(Value::as_object) {
            Some(analysis) => RawPayload::Nested {
                analysis: RawAnalysis::from_map(analysis),
                recommendations,
                message: string_field(root, "message"),
            },
            None => RawPayload::Flat {
                analysis: RawAnalysis::from_map(root),
                recommendations,
            },
        }
    }

    pub fn recommendations(&self) -> &[RawMovie] {
        match self {
            RawPayload::Nested {
                recommendations, ..
            }
            | RawPayload::Flat {
                recommendations, ..
            } => recommendations,
        }
    }
}

impl RawAnalysis {
    pub fn from_map(map: &Map<String, Value>) -> Self {
        Self {
            emotion: string_field(map, "emotion"),
            gender: string_field(map, "gender"),
            age: number_field(map, "age"),
            confidence: number_field(map, "confidence"),
            emotion_confidence: number_field(map, "emotion_confidence"),
        }
    }
}

impl RawMovie {
    pub fn from_value(value: &Value) -> Self {
        let Some(map) = value.as_object() else {
            return Self::default();
        };

        Self {
            title: string_field(map, "title"),
            overview: string_field(map, "overview"),
            poster_url: string_field(map, "poster_url"),
            release_date: string_field(map, "release_date"),
            rating: map.get("rating").and_then(Value::as_f64),
            genre_count: map.get("genres").and_then(Value::as_array).map(Vec::len),
        }
    }
}

fn recommendations(root: &Map<String, Value>) -> Vec<RawMovie> {
    root.get("recommendations")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(RawMovie::from_value).collect())
        .unwrap_or_default()
}

/// Non-empty string field
fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .map(str::to_string)
}

/// Numeric field; numeric strings such as `"30"` are accepted too
fn number_field(map: &Map<String, Value>, key: &str) -> Option<f64> {
    let number = match map.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nested_shape_detected() {
        let payload = RawPayload::from_value(&json!({
            "analysis": {"emotion": "happy", "age": 31},
            "recommendations": [{"title": "Up"}],
            "message": "Analysis complete"
        }));

        match payload {
            RawPayload::Nested {
                analysis,
                recommendations,
                message,
            } => {
                assert_eq!(analysis.emotion.as_deref(), Some("happy"));
                assert_eq!(analysis.age, Some(31.0));
                assert_eq!(recommendations.len(), 1);
                assert_eq!(message.as_deref(), Some("Analysis complete"));
            }
            other => panic!("expected nested payload, got {:?}", other),
        }
    }

    #[test]
    fn test_flat_shape_detected() {
        let payload = RawPayload::from_value(&json!({
            "emotion": "surprise",
            "gender": "Female",
            "age": 30,
            "confidence": 90
        }));

        match payload {
            RawPayload::Flat { analysis, .. } => {
                assert_eq!(analysis.emotion.as_deref(), Some("surprise"));
                assert_eq!(analysis.confidence, Some(90.0));
            }
            other => panic!("expected flat payload, got {:?}", other),
        }
    }

    #[test]
    fn test_non_object_analysis_falls_back_to_flat() {
        let payload = RawPayload::from_value(&json!({"analysis": "pending"}));
        assert!(matches!(payload, RawPayload::Flat { .. }));
    }

    #[test]
    fn test_non_object_payload_is_empty_flat() {
        let payload = RawPayload::from_value(&json!([1, 2, 3]));
        assert_eq!(
            payload,
            RawPayload::Flat {
                analysis: RawAnalysis::default(),
                recommendations: vec![],
            }
        );
    }

    #[test]
    fn test_wrong_field_types_are_absent() {
        let movie = RawMovie::from_value(&json!({
            "title": 42,
            "rating": "great",
            "genres": "Drama",
            "poster_url": null
        }));
        assert_eq!(movie, RawMovie::default());
    }

    #[test]
    fn test_numeric_strings_accepted_for_analysis() {
        let map = json!({"age": "27", "confidence": " 0.7 "});
        let analysis = RawAnalysis::from_map(map.as_object().unwrap());
        assert_eq!(analysis.age, Some(27.0));
        assert_eq!(analysis.confidence, Some(0.7));
    }

    #[test]
    fn test_genre_count_tracks_presence() {
        let with = RawMovie::from_value(&json!({"genres": ["Drama", "Comedy"]}));
        let empty = RawMovie::from_value(&json!({"genres": []}));
        let without = RawMovie::from_value(&json!({}));
        assert_eq!(with.genre_count, Some(2));
        assert_eq!(empty.genre_count, Some(0));
        assert_eq!(without.genre_count, None);
    }
}
