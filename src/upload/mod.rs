mod classify;
mod client;
mod file_acceptor;
mod judgment;
mod orchestrator;
mod types;

pub use classify::{classify, ClassifiedError, FailureStatus, RawFailure};
pub use client::{SegmentationClient, Transport};
pub use file_acceptor::{FileAcceptor, RejectionReason, ValidationOutcome, MAX_FILE_SIZE};
pub use judgment::{confidence_tier, warning_panel, ConfidenceTier, WarningPanel, WarningSeverity};
pub use orchestrator::{
    RetryAvailability, SelectionTicket, UploadOrchestrator, UploadRequest, UploadState,
    UploadTicket, MAX_ATTEMPTS, RETRIES_EXHAUSTED_MESSAGE,
};
pub use types::{
    declared_type_for, FileCandidate, HealthStatus, ImageType, QualityMetrics, SegmentationResult,
    SelectedFile,
};
