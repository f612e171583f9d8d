/// Application-level errors
///
/// `Display` is the single human-readable message surfaced to the user;
/// every variant is recoverable and the user can always retry a capture.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(
        "Unable to connect to the recommendation backend. Please ensure:\n\
         • The backend server is running on {url}\n\
         • Required model files are present"
    )]
    Connectivity { url: String, reason: String },

    #[error("Server Error ({status}): {message}")]
    Server { status: u16, message: String },

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Capture(String),

    #[error("Invalid backend response: {0}")]
    InvalidResponse(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for errors raised before any network call was attempted
    pub fn is_preflight(&self) -> bool {
        matches!(self, AppError::Validation(_) | AppError::InvalidInput(_))
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        AppError::Capture(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
