pub mod backend;
pub mod capture;
pub mod catalog;
pub mod normalizer;
pub mod pipeline;
pub mod tracker;

pub use backend::{CatalogSource, HttpBackend, RecommendationBackend};
pub use capture::ImagePayload;
pub use normalizer::Normalizer;
pub use pipeline::{IgnoreReason, RecommendationPipeline, Submission};
pub use tracker::UploadTracker;
