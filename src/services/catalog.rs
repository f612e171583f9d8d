use crate::{
    error::{AppError, AppResult},
    models::Movie,
    services::backend::CatalogSource,
};
use std::sync::Arc;

/// Searches the catalog by title
///
/// Blank queries are rejected up front. An unreachable or failing search
/// endpoint yields no results rather than an error.
pub async fn search_movies(source: Arc<dyn CatalogSource>, query: &str) -> AppResult<Vec<Movie>> {
    let query = query.trim();
    if query.is_empty() {
        return Err(AppError::InvalidInput(
            "Search query cannot be empty".to_string(),
        ));
    }

    Ok(or_empty(source.search_movies(query).await, "search"))
}

pub async fn trending_movies(source: Arc<dyn CatalogSource>) -> Vec<Movie> {
    or_empty(source.trending_movies().await, "trending")
}

pub async fn popular_movies(source: Arc<dyn CatalogSource>) -> Vec<Movie> {
    or_empty(source.popular_movies().await, "popular")
}

fn or_empty(result: AppResult<Vec<Movie>>, feed: &'static str) -> Vec<Movie> {
    result.unwrap_or_else(|e| {
        tracing::warn!(feed, error = %e, "Catalog endpoint not available, returning no results");
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::backend::MockCatalogSource;

    fn movie(id: u64, title: &str) -> Movie {
        serde_json::from_value(serde_json::json!({"id": id, "title": title})).unwrap()
    }

    #[tokio::test]
    async fn test_blank_query_rejected() {
        let mut source = MockCatalogSource::new();
        source.expect_search_movies().never();

        let result = search_movies(Arc::new(source), "   ").await;
        assert!(matches!(result, Err(AppError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_search_trims_query() {
        let mut source = MockCatalogSource::new();
        source
            .expect_search_movies()
            .withf(|query| query == "heat")
            .returning(|_| Ok(vec![movie(949, "Heat")]));

        let results = search_movies(Arc::new(source), "  heat ").await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Heat");
    }

    #[tokio::test]
    async fn test_search_failure_yields_no_results() {
        let mut source = MockCatalogSource::new();
        source.expect_search_movies().returning(|_| {
            Err(AppError::Server {
                status: 404,
                message: "Not Found".to_string(),
            })
        });

        let results = search_movies(Arc::new(source), "heat").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_feeds_fall_back_to_empty() {
        let mut source = MockCatalogSource::new();
        source
            .expect_trending_movies()
            .returning(|| Ok(vec![movie(1, "Dune"), movie(2, "Alien")]));
        source.expect_popular_movies().returning(|| {
            Err(AppError::Connectivity {
                url: "http://localhost:5000".to_string(),
                reason: "refused".to_string(),
            })
        });
        let source: Arc<dyn CatalogSource> = Arc::new(source);

        assert_eq!(trending_movies(source.clone()).await.len(), 2);
        assert!(popular_movies(source).await.is_empty());
    }
}
