pub mod config;
pub mod error;
pub mod models;
pub mod presenter;
pub mod services;
pub mod session;
pub mod storage;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, AppResult};
