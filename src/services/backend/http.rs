/// HTTP client for the recommendation backend
///
/// Endpoints:
/// 1. Health: GET /api/health → `{"status": "healthy"}`
/// 2. Recommend: POST /api/recommend (multipart `file`) → analysis + movies
/// 3. Analyze: POST /api/analyze (multipart `file`) → analysis only
/// 4. Catalog: GET /api/search?q=, /api/trending/movies, /api/popular/movies
use std::time::Duration;

use reqwest::{
    multipart::{Form, Part},
    Client as HttpClient, Response,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{Movie, RawAnalysis, RecommendationResponse, UserAnalysis},
    services::{
        backend::{CatalogSource, RecommendationBackend},
        capture::ImagePayload,
        normalizer::{self, Normalizer},
    },
};

/// Fixed timeout for image uploads; the backend runs two models per request
pub const RECOMMEND_TIMEOUT: Duration = Duration::from_secs(30);

const SERVER_ERROR_FALLBACK: &str = "Server error occurred";

#[derive(Debug, Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct MovieListResponse {
    #[serde(default)]
    results: Vec<Value>,
}

#[derive(Clone)]
pub struct HttpBackend {
    http_client: HttpClient,
    api_url: String,
    health_timeout: Duration,
    normalizer: Normalizer,
}

impl HttpBackend {
    pub fn new(
        api_url: impl Into<String>,
        health_timeout: Duration,
        normalizer: Normalizer,
    ) -> AppResult<Self> {
        Ok(Self {
            http_client: build_client(RECOMMEND_TIMEOUT)?,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            health_timeout,
            normalizer,
        })
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        Self::new(
            config.api_url.clone(),
            config.health_timeout(),
            Normalizer::new(config.placeholders),
        )
    }

    /// Replaces the upload timeout, which is otherwise [`RECOMMEND_TIMEOUT`]
    pub fn with_request_timeout(mut self, timeout: Duration) -> AppResult<Self> {
        self.http_client = build_client(timeout)?;
        Ok(self)
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Maps a transport failure onto the error taxonomy
    fn classify(&self, err: reqwest::Error) -> AppError {
        if err.is_decode() {
            AppError::InvalidResponse(err.to_string())
        } else if err.is_builder() {
            AppError::Internal(err.to_string())
        } else {
            tracing::warn!(
                url = %self.api_url,
                timeout = err.is_timeout(),
                reason = %err,
                "Recommendation backend unreachable"
            );
            AppError::Connectivity {
                url: self.api_url.clone(),
                reason: err.to_string(),
            }
        }
    }

    /// Builds a server error from a non-2xx response body
    async fn server_error(response: Response) -> AppError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let message = serde_json::from_str::<Value>(&body)
            .ok()
            .and_then(|json| {
                ["error", "message"].iter().find_map(|key| {
                    json.get(*key)
                        .and_then(Value::as_str)
                        .filter(|s| !s.is_empty())
                        .map(str::to_string)
                })
            })
            .unwrap_or_else(|| SERVER_ERROR_FALLBACK.to_string());

        tracing::error!(
            status = %status,
            body = %body,
            "Recommendation backend request failed"
        );

        AppError::Server {
            status: status.as_u16(),
            message,
        }
    }

    /// Uploads the image as multipart field `file` and returns the JSON body
    async fn post_image(&self, path: &str, image: &ImagePayload) -> AppResult<Value> {
        let part = Part::bytes(image.bytes().to_vec())
            .file_name(image.file_name().to_string())
            .mime_str(image.content_type())
            .map_err(|e| AppError::Validation(format!("Unsupported content type: {}", e)))?;
        let form = Form::new().part("file", part);

        tracing::debug!(
            path = %path,
            file = %image.file_name(),
            bytes = image.len(),
            "Uploading image"
        );

        let response = self
            .http_client
            .post(self.url(path))
            .multipart(form)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }

        let response_text = response.text().await.map_err(|e| self.classify(e))?;
        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                response = %response_text,
                "Failed to parse backend response"
            );
            AppError::InvalidResponse(format!("Failed to parse backend response: {}", e))
        })
    }

    async fn fetch_movies(&self, path: &str, query: &[(&str, &str)]) -> AppResult<Vec<Movie>> {
        let response = self
            .http_client
            .get(self.url(path))
            .query(query)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            return Err(Self::server_error(response).await);
        }

        let list: MovieListResponse = response.json().await.map_err(|e| self.classify(e))?;

        // Skip entries that do not look like catalog movies
        let movies: Vec<Movie> = list
            .results
            .into_iter()
            .filter_map(|result| serde_json::from_value::<Movie>(result).ok())
            .collect();

        tracing::info!(path = %path, results = movies.len(), "Catalog fetched");

        Ok(movies)
    }
}

fn build_client(timeout: Duration) -> AppResult<HttpClient> {
    HttpClient::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))
}

#[async_trait::async_trait]
impl RecommendationBackend for HttpBackend {
    async fn check_health(&self) -> bool {
        let result = self
            .http_client
            .get(self.url("/api/health"))
            .timeout(self.health_timeout)
            .send()
            .await;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(error = %e, url = %self.api_url, "Backend health check failed");
                return false;
            }
        };

        if !response.status().is_success() {
            tracing::warn!(status = %response.status(), "Backend health check returned error status");
            return false;
        }

        match response.json::<HealthResponse>().await {
            Ok(health) => {
                tracing::info!(status = %health.status, "Backend health");
                health.status == "healthy"
            }
            Err(e) => {
                tracing::warn!(error = %e, "Backend health response unreadable");
                false
            }
        }
    }

    async fn get_recommendations(&self, image: &ImagePayload) -> AppResult<RecommendationResponse> {
        let body = self.post_image("/api/recommend", image).await?;
        let response = self.normalizer.normalize(&body);

        tracing::info!(
            emotion = %response.analysis.emotion,
            age = response.analysis.age,
            gender = %response.analysis.gender,
            movies = response.recommendations.len(),
            provider = self.name(),
            "Recommendations received"
        );

        Ok(response)
    }

    async fn analyze_image(&self, image: &ImagePayload) -> AppResult<UserAnalysis> {
        let body = self.post_image("/api/analyze", image).await?;
        let analysis = body
            .get("analysis")
            .and_then(Value::as_object)
            .or_else(|| body.as_object())
            .map(RawAnalysis::from_map)
            .unwrap_or_default();

        Ok(normalizer::nested_analysis(&analysis))
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

#[async_trait::async_trait]
impl CatalogSource for HttpBackend {
    async fn search_movies(&self, query: &str) -> AppResult<Vec<Movie>> {
        self.fetch_movies("/api/search", &[("q", query)]).await
    }

    async fn trending_movies(&self) -> AppResult<Vec<Movie>> {
        self.fetch_movies("/api/trending/movies", &[]).await
    }

    async fn popular_movies(&self) -> AppResult<Vec<Movie>> {
        self.fetch_movies("/api/popular/movies", &[]).await
    }
}
