use chrono::{DateTime, Utc};
use serde::Serialize;

/// Standard API response wrapper
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present on success)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Response timestamp
    pub timestamp: DateTime<Utc>,
    /// Request metadata
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ResponseMetadata>,
}

/// Additional metadata about the response
#[derive(Debug, Default, Serialize)]
pub struct ResponseMetadata {
    /// Total count of items (for list responses)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_count: Option<usize>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a successful response with data
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            timestamp: Utc::now(),
            metadata: None,
        }
    }

    /// Add total count to metadata
    pub fn with_count(mut self, count: usize) -> Self {
        let metadata = self.metadata.take().unwrap_or_default();
        self.metadata = Some(ResponseMetadata {
            total_count: Some(count),
            ..metadata
        });
        self
    }
}
