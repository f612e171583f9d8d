use serde::Serialize;

/// Last known reachability of the recommendation backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendStatus {
    #[default]
    Checking,
    Connected,
    Disconnected,
}

/// Per-user session state passed explicitly to the pipeline
#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    user_id: Option<String>,
    backend_status: BackendStatus,
}

impl SessionContext {
    /// Creates a session, optionally tied to a user id
    pub fn new(user_id: Option<String>) -> Self {
        Self {
            user_id,
            backend_status: BackendStatus::Checking,
        }
    }

    pub fn anonymous() -> Self {
        Self::new(None)
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    pub fn backend_status(&self) -> BackendStatus {
        self.backend_status
    }

    pub fn set_backend_status(&mut self, status: BackendStatus) {
        self.backend_status = status;
    }

    /// Capture controls are only offered against a reachable backend
    pub fn capture_enabled(&self) -> bool {
        self.backend_status == BackendStatus::Connected
    }

    pub fn status_text(&self) -> &'static str {
        match self.backend_status {
            BackendStatus::Checking => "Checking backend connection...",
            BackendStatus::Connected => "Connected to the recommendation backend",
            BackendStatus::Disconnected => {
                "Recommendation backend not available - please start the backend server"
            }
        }
    }
}
