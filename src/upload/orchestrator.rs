//! Upload lifecycle for a single image.
//!
//! All state lives in one [`UploadState`] value. File reads and uploads run
//! elsewhere and report back with the ticket they were issued; a report whose
//! ticket is no longer current is dropped so that a result can never be shown
//! against a file other than the one that produced it.

use crate::upload::classify::{classify, ClassifiedError, RawFailure};
use crate::upload::file_acceptor::{RejectionReason, ValidationOutcome};
use crate::upload::types::{SegmentationResult, SelectedFile};
use std::mem;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Failed attempts allowed before retrying is switched off.
pub const MAX_ATTEMPTS: u32 = 3;

pub const RETRIES_EXHAUSTED_MESSAGE: &str =
    "Multiple attempts failed. Please check your image file and network connection.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SelectionTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UploadTicket(u64);

#[derive(Debug, Clone, PartialEq, Default)]
pub enum UploadState {
    #[default]
    Idle,
    Ready {
        file: Arc<SelectedFile>,
    },
    Pending {
        file: Arc<SelectedFile>,
        /// Failed attempts before this one.
        attempts: u32,
        ticket: UploadTicket,
    },
    Succeeded {
        file: Arc<SelectedFile>,
        result: SegmentationResult,
    },
    Failed {
        file: Arc<SelectedFile>,
        error: ClassifiedError,
        attempts: u32,
    },
}

impl UploadState {
    pub fn file(&self) -> Option<&Arc<SelectedFile>> {
        match self {
            Self::Idle => None,
            Self::Ready { file }
            | Self::Pending { file, .. }
            | Self::Succeeded { file, .. }
            | Self::Failed { file, .. } => Some(file),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Ready { .. } => "ready",
            Self::Pending { .. } => "pending",
            Self::Succeeded { .. } => "succeeded",
            Self::Failed { .. } => "failed",
        }
    }
}

/// Work order for the transport: send `file` and report back with `ticket`.
#[derive(Debug, Clone)]
pub struct UploadRequest {
    pub ticket: UploadTicket,
    pub file: Arc<SelectedFile>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAvailability {
    Available { attempt: u32, max: u32 },
    Exhausted,
}

impl RetryAvailability {
    pub fn message(&self) -> String {
        match self {
            Self::Available { attempt, max } => format!("Attempt {} of {}", attempt, max),
            Self::Exhausted => RETRIES_EXHAUSTED_MESSAGE.to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub struct UploadOrchestrator {
    state: UploadState,
    preview: Option<String>,
    file_error: Option<RejectionReason>,
    selection_seq: u64,
    upload_seq: u64,
    in_flight: Option<UploadTicket>,
}

impl UploadOrchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &UploadState {
        &self.state
    }

    /// Data URI of the currently selected file.
    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn file_error(&self) -> Option<RejectionReason> {
        self.file_error
    }

    /// Marks the start of a new file read. Any read started earlier becomes stale.
    pub fn begin_selection(&mut self) -> SelectionTicket {
        self.selection_seq += 1;
        SelectionTicket(self.selection_seq)
    }

    /// Applies a finished validation. Returns `false` when the ticket was superseded.
    ///
    /// Any result or error held for the previous file is dropped. A request that
    /// is still in flight keeps running, but its outcome will be discarded.
    pub fn select(&mut self, ticket: SelectionTicket, outcome: ValidationOutcome) -> bool {
        if ticket.0 != self.selection_seq {
            debug!(?ticket, current = self.selection_seq, "Discarding stale file read");
            return false;
        }

        let previous = self.state.name();
        match outcome {
            ValidationOutcome::Accepted { file, preview } => {
                info!(file = %file.file_name, from = previous, "File selected");
                self.state = UploadState::Ready {
                    file: Arc::new(file),
                };
                self.preview = Some(preview);
                self.file_error = None;
            }
            ValidationOutcome::Rejected(reason) => {
                info!(%reason, from = previous, "Selection rejected");
                self.state = UploadState::Idle;
                self.preview = None;
                self.file_error = Some(reason);
            }
        }
        true
    }

    /// Starts the upload of the selected file. Ignored unless `Ready` with nothing in flight.
    pub fn submit(&mut self) -> Option<UploadRequest> {
        if let Some(ticket) = self.in_flight {
            debug!(?ticket, "Submit ignored, a request is already in flight");
            return None;
        }

        match &self.state {
            UploadState::Ready { file } => {
                let file = Arc::clone(file);
                Some(self.start(file, 0))
            }
            other => {
                debug!(state = other.name(), "Submit ignored");
                None
            }
        }
    }

    /// Resends the same payload after a failure, while the attempt budget allows.
    pub fn retry(&mut self) -> Option<UploadRequest> {
        if self.in_flight.is_some() {
            return None;
        }

        match &self.state {
            UploadState::Failed { file, attempts, .. } if *attempts < MAX_ATTEMPTS => {
                let (file, attempts) = (Arc::clone(file), *attempts);
                Some(self.start(file, attempts))
            }
            other => {
                debug!(state = other.name(), "Retry not available");
                None
            }
        }
    }

    /// Applies a transport outcome. Returns `false` when the request was superseded.
    pub fn complete_upload(
        &mut self,
        ticket: UploadTicket,
        outcome: Result<SegmentationResult, RawFailure>,
    ) -> bool {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
        }

        let (file, attempts) = match mem::take(&mut self.state) {
            UploadState::Pending {
                file,
                attempts,
                ticket: current,
            } if current == ticket => (file, attempts),
            other => {
                debug!(?ticket, state = other.name(), "Discarding stale upload outcome");
                self.state = other;
                return false;
            }
        };

        self.state = match outcome {
            Ok(result) => {
                info!(
                    file = %file.file_name,
                    confidence = result.confidence_score,
                    inference_ms = result.inference_time,
                    "Segmentation succeeded"
                );
                UploadState::Succeeded { file, result }
            }
            Err(raw) => {
                let error = classify(&raw);
                let attempts = attempts + 1;
                warn!(
                    file = %file.file_name,
                    status = ?raw.status,
                    error = ?error,
                    attempts,
                    "Upload failed"
                );
                UploadState::Failed {
                    file,
                    error,
                    attempts,
                }
            }
        };
        true
    }

    /// Back to `Idle`, dropping the file, preview and any pending file read.
    pub fn reset(&mut self) {
        self.selection_seq += 1;
        self.state = UploadState::Idle;
        self.preview = None;
        self.file_error = None;
    }

    pub fn can_submit(&self) -> bool {
        self.in_flight.is_none() && matches!(self.state, UploadState::Ready { .. })
    }

    pub fn is_pending(&self) -> bool {
        matches!(self.state, UploadState::Pending { .. })
    }

    pub fn attempt_count(&self) -> u32 {
        match self.state {
            UploadState::Pending { attempts, .. } | UploadState::Failed { attempts, .. } => attempts,
            _ => 0,
        }
    }

    pub fn result(&self) -> Option<&SegmentationResult> {
        match &self.state {
            UploadState::Succeeded { result, .. } => Some(result),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&ClassifiedError> {
        match &self.state {
            UploadState::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        self.error().map(ClassifiedError::message)
    }

    pub fn retry_availability(&self) -> Option<RetryAvailability> {
        match self.state {
            UploadState::Failed { attempts, .. } if attempts < MAX_ATTEMPTS => {
                Some(RetryAvailability::Available {
                    attempt: attempts,
                    max: MAX_ATTEMPTS,
                })
            }
            UploadState::Failed { .. } => Some(RetryAvailability::Exhausted),
            _ => None,
        }
    }

    fn start(&mut self, file: Arc<SelectedFile>, attempts: u32) -> UploadRequest {
        self.upload_seq += 1;
        let ticket = UploadTicket(self.upload_seq);
        info!(file = %file.file_name, attempt = attempts + 1, "Submitting upload");

        self.in_flight = Some(ticket);
        self.state = UploadState::Pending {
            file: Arc::clone(&file),
            attempts,
            ticket,
        };
        UploadRequest { ticket, file }
    }
}
