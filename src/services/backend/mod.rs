/// Recommendation backend abstraction
///
/// The facial analysis and movie matching run in an external HTTP service.
/// The pipeline only talks to it through these traits so runs can be driven
/// against a fake in tests.
use crate::{
    error::AppResult,
    models::{Movie, RecommendationResponse, UserAnalysis},
    services::capture::ImagePayload,
};

pub mod http;

pub use http::{HttpBackend, RECOMMEND_TIMEOUT};

/// Image analysis and recommendation calls
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait RecommendationBackend: Send + Sync {
    /// Probe the backend; any failure reads as unhealthy, never as an error
    async fn check_health(&self) -> bool;

    /// Upload one capture and return the normalized analysis and recommendations
    ///
    /// Fails with a classified error on network failure or a non-2xx status;
    /// never returns partial data.
    async fn get_recommendations(&self, image: &ImagePayload) -> AppResult<RecommendationResponse>;

    /// Analysis only, without recommendations
    async fn analyze_image(&self, image: &ImagePayload) -> AppResult<UserAnalysis>;

    /// Backend name for logging
    fn name(&self) -> &'static str;
}

/// Movie catalog feeds exposed by the same backend
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait CatalogSource: Send + Sync {
    async fn search_movies(&self, query: &str) -> AppResult<Vec<Movie>>;

    async fn trending_movies(&self) -> AppResult<Vec<Movie>>;

    async fn popular_movies(&self) -> AppResult<Vec<Movie>>;
}
