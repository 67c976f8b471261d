//! Annotation server port
//!
//! The orchestrator reaches the server only through [`AnnotationApi`]: one read
//! (unit data) and one write (form post).

use anno_model::{SubmitForm, SubmitResponse, UnitId, UnitRecord};
use async_trait::async_trait;

/// Errors from the annotation server
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Request did not complete
    #[error("transport failed: {0}")]
    Transport(String),

    /// Server answered with an error status
    #[error("server returned status {0}")]
    Status(u16),

    /// Body could not be decoded
    #[error("invalid response body: {0}")]
    Decode(String),

    /// Unit-data response has no entry for the unit
    #[error("unit {0} missing from response")]
    MissingUnit(UnitId),
}

impl ApiError {
    /// Check if the request may succeed when repeated
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Status(status) => *status >= 500,
            Self::Decode(_) | Self::MissingUnit(_) => false,
        }
    }
}

/// Read and write access to the annotation server
#[async_trait]
pub trait AnnotationApi: Send + Sync {
    /// Fetch the current record of a unit
    async fn fetch_unit(&self, unit: UnitId) -> Result<UnitRecord, ApiError>;

    /// Post a form
    async fn submit(&self, form: SubmitForm) -> Result<SubmitResponse, ApiError>;
}
