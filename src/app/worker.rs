use crate::upload::{
    FileAcceptor, FileCandidate, HealthStatus, RawFailure, RejectionReason, SegmentationResult,
    SelectionTicket, Transport, UploadRequest, UploadTicket, ValidationOutcome,
};
use super::HealthTicket;
use std::path::PathBuf;
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{debug, info, warn};

/// Completion messages sent back to the UI thread.
#[derive(Debug)]
pub enum AppEvent {
    FileRead {
        ticket: SelectionTicket,
        outcome: ValidationOutcome,
    },
    UploadFinished {
        ticket: UploadTicket,
        outcome: Result<SegmentationResult, RawFailure>,
    },
    Health {
        ticket: HealthTicket,
        outcome: Result<HealthStatus, RawFailure>,
    },
}

/// Reads and validates `path` off the UI thread.
pub fn spawn_file_read<F>(
    runtime: &Handle,
    ticket: SelectionTicket,
    path: PathBuf,
    sender: Sender<AppEvent>,
    notify: F,
) where
    F: Fn() + Send + 'static,
{
    runtime.spawn(async move {
        let outcome = match FileCandidate::from_path(&path) {
            Ok(candidate) => FileAcceptor::validate(&candidate).await,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to stat file");
                ValidationOutcome::Rejected(RejectionReason::Unreadable)
            }
        };
        info!(path = %path.display(), accepted = outcome.is_accepted(), "File read finished");

        deliver(&sender, AppEvent::FileRead { ticket, outcome });
        notify();
    });
}

pub fn spawn_upload<F>(
    runtime: &Handle,
    transport: Arc<dyn Transport>,
    request: UploadRequest,
    sender: Sender<AppEvent>,
    notify: F,
) where
    F: Fn() + Send + 'static,
{
    runtime.spawn(async move {
        let outcome = transport.upload(&request.file).await;
        deliver(
            &sender,
            AppEvent::UploadFinished {
                ticket: request.ticket,
                outcome,
            },
        );
        notify();
    });
}

pub fn spawn_health_check<F>(
    runtime: &Handle,
    transport: Arc<dyn Transport>,
    ticket: HealthTicket,
    sender: Sender<AppEvent>,
    notify: F,
) where
    F: Fn() + Send + 'static,
{
    runtime.spawn(async move {
        let outcome = transport.health().await;
        deliver(&sender, AppEvent::Health { ticket, outcome });
        notify();
    });
}

fn deliver(sender: &Sender<AppEvent>, event: AppEvent) {
    if sender.send(event).is_err() {
        debug!("UI closed before the event was delivered");
    }
}
