use async_trait::async_trait;
use std::collections::VecDeque;
use std::io::Write;
use std::sync::mpsc::{self, Receiver};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::Builder;
use tokio::runtime::Runtime;
use ultrasound_segmenter::app::worker::{self, AppEvent};
use ultrasound_segmenter::app::ViewState;
use ultrasound_segmenter::upload::{
    confidence_tier, warning_panel, ConfidenceTier, HealthStatus, QualityMetrics, RawFailure,
    RetryAvailability, SegmentationResult, SelectedFile, Transport, UploadOrchestrator,
    UploadState,
};

/// Replays canned outcomes and records what was sent.
struct ScriptedTransport {
    outcomes: Mutex<VecDeque<Result<SegmentationResult, RawFailure>>>,
    sent: Mutex<Vec<(String, usize)>>,
}

impl ScriptedTransport {
    fn new(outcomes: Vec<Result<SegmentationResult, RawFailure>>) -> Arc<Self> {
        Arc::new(Self {
            outcomes: Mutex::new(outcomes.into()),
            sent: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn upload(&self, file: &SelectedFile) -> Result<SegmentationResult, RawFailure> {
        self.sent
            .lock()
            .unwrap()
            .push((file.file_name.clone(), file.bytes.len()));
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RawFailure::default()))
    }

    async fn health(&self) -> Result<HealthStatus, RawFailure> {
        Ok(HealthStatus {
            status: "healthy".to_string(),
            model_loaded: true,
        })
    }
}

fn segmentation(score: f64, warnings: &[&str]) -> SegmentationResult {
    SegmentationResult {
        success: true,
        original: "AAAA".to_string(),
        segmentation: "BBBB".to_string(),
        inference_time: 640.0,
        is_valid_ultrasound: true,
        confidence_score: score,
        quality_metrics: QualityMetrics {
            mask_area_ratio: 0.18,
            mask_circularity: 0.91,
            edge_sharpness: 0.52,
            is_valid_shape: true,
        },
        warnings: warnings.iter().map(|w| w.to_string()).collect(),
        error: None,
    }
}

fn next_event(receiver: &Receiver<AppEvent>) -> AppEvent {
    receiver
        .recv_timeout(Duration::from_secs(10))
        .expect("worker did not report back")
}

fn apply(orchestrator: &mut UploadOrchestrator, event: AppEvent) -> bool {
    match event {
        AppEvent::FileRead { ticket, outcome } => orchestrator.select(ticket, outcome),
        AppEvent::UploadFinished { ticket, outcome } => orchestrator.complete_upload(ticket, outcome),
        AppEvent::Health { .. } => false,
    }
}

fn jpeg_on_disk(size: usize) -> tempfile::NamedTempFile {
    let mut file = Builder::new().suffix(".jpg").tempfile().unwrap();
    file.write_all(&vec![0xAB; size]).unwrap();
    file
}

#[test]
fn five_megabyte_jpeg_end_to_end() {
    let runtime = Runtime::new().unwrap();
    let (sender, receiver) = mpsc::channel();
    let transport = ScriptedTransport::new(vec![Ok(segmentation(0.82, &[]))]);
    let mut orchestrator = UploadOrchestrator::new();

    let image = jpeg_on_disk(5 * 1024 * 1024);
    let ticket = orchestrator.begin_selection();
    worker::spawn_file_read(
        runtime.handle(),
        ticket,
        image.path().to_path_buf(),
        sender.clone(),
        || {},
    );
    assert!(apply(&mut orchestrator, next_event(&receiver)));
    assert!(matches!(orchestrator.state(), UploadState::Ready { .. }));
    assert!(orchestrator.preview().unwrap().starts_with("data:image/jpeg;base64,"));

    let request = orchestrator.submit().unwrap();
    assert!(orchestrator.is_pending());
    worker::spawn_upload(
        runtime.handle(),
        transport.clone(),
        request,
        sender.clone(),
        || {},
    );
    assert!(apply(&mut orchestrator, next_event(&receiver)));

    let result = orchestrator.result().expect("upload should succeed");
    assert_eq!(confidence_tier(result.confidence_score), ConfidenceTier::High);
    assert_eq!(warning_panel(result), None);
    assert_eq!(orchestrator.attempt_count(), 0);
    assert_eq!(
        transport.sent.lock().unwrap().as_slice(),
        &[(
            image.path().file_name().unwrap().to_string_lossy().to_string(),
            5 * 1024 * 1024
        )]
    );
}

#[test]
fn failures_are_retried_with_the_same_payload_until_exhausted() {
    let runtime = Runtime::new().unwrap();
    let (sender, receiver) = mpsc::channel();
    let transport = ScriptedTransport::new(vec![
        Err(RawFailure::http(500, None)),
        Err(RawFailure::http(408, None)),
        Err(RawFailure::default()),
    ]);
    let mut orchestrator = UploadOrchestrator::new();

    let image = jpeg_on_disk(1024);
    let ticket = orchestrator.begin_selection();
    worker::spawn_file_read(
        runtime.handle(),
        ticket,
        image.path().to_path_buf(),
        sender.clone(),
        || {},
    );
    apply(&mut orchestrator, next_event(&receiver));

    let mut request = orchestrator.submit();
    let mut messages = Vec::new();
    while let Some(pending) = request {
        worker::spawn_upload(
            runtime.handle(),
            transport.clone(),
            pending,
            sender.clone(),
            || {},
        );
        apply(&mut orchestrator, next_event(&receiver));
        messages.push(orchestrator.error_message().unwrap());
        request = orchestrator.retry();
    }

    assert_eq!(
        messages,
        vec![
            "Server error. Please try again later.",
            "Request timeout. The server took too long to respond. Please try again.",
            "Network error. Please check your connection and try again.",
        ]
    );
    assert_eq!(orchestrator.retry_availability(), Some(RetryAvailability::Exhausted));

    let sent = transport.sent.lock().unwrap();
    assert_eq!(sent.len(), 3);
    assert!(sent.iter().all(|(_, len)| *len == 1024));
}

#[test]
fn unsupported_file_never_reaches_the_transport() {
    let runtime = Runtime::new().unwrap();
    let (sender, receiver) = mpsc::channel();
    let transport = ScriptedTransport::new(Vec::new());
    let mut orchestrator = UploadOrchestrator::new();

    let mut notes = Builder::new().suffix(".txt").tempfile().unwrap();
    notes.write_all(b"not an image").unwrap();

    let ticket = orchestrator.begin_selection();
    worker::spawn_file_read(
        runtime.handle(),
        ticket,
        notes.path().to_path_buf(),
        sender,
        || {},
    );
    apply(&mut orchestrator, next_event(&receiver));

    assert_eq!(orchestrator.state(), &UploadState::Idle);
    assert!(orchestrator.file_error().is_some());
    assert!(orchestrator.submit().is_none());
    assert!(transport.sent.lock().unwrap().is_empty());
}

#[test]
fn health_check_reports_back() {
    let runtime = Runtime::new().unwrap();
    let (sender, receiver) = mpsc::channel();
    let transport = ScriptedTransport::new(Vec::new());
    let mut view = ViewState::default();

    let stale = view.begin_health_check();
    let current = view.begin_health_check();
    worker::spawn_health_check(runtime.handle(), transport.clone(), stale, sender.clone(), || {});
    worker::spawn_health_check(runtime.handle(), transport, current, sender, || {});

    let mut applied = Vec::new();
    for _ in 0..2 {
        match next_event(&receiver) {
            AppEvent::Health { ticket, outcome } => {
                applied.push(view.finish_health_check(ticket, outcome));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    assert_eq!(applied.iter().filter(|ok| **ok).count(), 1);
    assert!(view.health.is_ready());
}
