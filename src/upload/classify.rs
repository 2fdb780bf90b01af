use serde_json::Value;

const INVALID_IMAGE_MESSAGE: &str = "Invalid image file. Please upload a valid ultrasound image.";

/// How a request failed before any interpretation.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureStatus {
    /// The server answered with a non-success status.
    Http(u16),
    /// The request never reached the server (DNS, refused connection, reset).
    FetchError,
    /// No response inside the client timeout.
    TimeoutError,
    /// A success status whose body was not the expected shape.
    ParsingError,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawFailure {
    pub status: Option<FailureStatus>,
    pub body: Option<Value>,
}

impl RawFailure {
    pub fn http(code: u16, body: Option<Value>) -> Self {
        Self {
            status: Some(FailureStatus::Http(code)),
            body,
        }
    }

    pub fn transport(status: FailureStatus) -> Self {
        Self {
            status: Some(status),
            body: None,
        }
    }

    /// The `error` string of a structured `{ "error": ... }` body, if present.
    pub fn error_detail(&self) -> Option<&str> {
        self.body.as_ref()?.get("error")?.as_str()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassifiedError {
    #[error("Request timeout. The server took too long to respond. Please try again.")]
    Timeout,
    #[error("File too large. Maximum size is 16 MB.")]
    PayloadTooLarge,
    #[error("Server error. Please try again later.")]
    ServerFault,
    #[error("{}", .0.as_deref().unwrap_or(INVALID_IMAGE_MESSAGE))]
    InvalidImage(Option<String>),
    #[error("Network error. Please check your connection and try again.")]
    NetworkUnreachable,
    #[error("Failed to process image. Please try again.")]
    Unknown,
}

impl ClassifiedError {
    pub fn message(&self) -> String {
        self.to_string()
    }
}

/// Ordered decision table over a raw failure; the first matching rule applies.
pub fn classify(raw: &RawFailure) -> ClassifiedError {
    match &raw.status {
        Some(FailureStatus::Http(408)) | Some(FailureStatus::TimeoutError) => ClassifiedError::Timeout,
        Some(FailureStatus::Http(413)) => ClassifiedError::PayloadTooLarge,
        Some(FailureStatus::Http(500)) => ClassifiedError::ServerFault,
        Some(FailureStatus::Http(400)) => {
            ClassifiedError::InvalidImage(raw.error_detail().map(str::to_string))
        }
        None | Some(FailureStatus::FetchError) => ClassifiedError::NetworkUnreachable,
        Some(_) => ClassifiedError::Unknown,
    }
}
