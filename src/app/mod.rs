mod state;
mod ui;
pub mod worker;

use crate::upload::{Transport, UploadOrchestrator, UploadRequest};
use eframe::{egui, App};
pub use state::{HealthIndicator, HealthTicket, TextureSlot, ViewState};
use std::path::PathBuf;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::info;
use worker::AppEvent;

pub struct SegmentationApp {
    orchestrator: UploadOrchestrator,
    view: ViewState,
    transport: Arc<dyn Transport>,
    runtime: Handle,
    sender: Sender<AppEvent>,
    receiver: Receiver<AppEvent>,
}

impl SegmentationApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        transport: Arc<dyn Transport>,
        runtime: Handle,
    ) -> Self {
        info!("Initializing ultrasound segmentation client");
        let (sender, receiver) = mpsc::channel();
        let mut app = Self {
            orchestrator: UploadOrchestrator::new(),
            view: ViewState::default(),
            transport,
            runtime,
            sender,
            receiver,
        };
        app.check_health(&cc.egui_ctx);
        app
    }

    pub fn check_health(&mut self, ctx: &egui::Context) {
        let ticket = self.view.begin_health_check();
        let ctx = ctx.clone();
        worker::spawn_health_check(
            &self.runtime,
            Arc::clone(&self.transport),
            ticket,
            self.sender.clone(),
            move || ctx.request_repaint(),
        );
    }

    pub fn load_file(&mut self, path: PathBuf, ctx: &egui::Context) {
        let ticket = self.orchestrator.begin_selection();
        self.view.reading_file = Some(
            path.file_name()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string(),
        );

        let ctx = ctx.clone();
        worker::spawn_file_read(&self.runtime, ticket, path, self.sender.clone(), move || {
            ctx.request_repaint()
        });
    }

    pub fn submit(&mut self, ctx: &egui::Context) {
        if let Some(request) = self.orchestrator.submit() {
            self.dispatch(request, ctx);
        }
    }

    pub fn retry(&mut self, ctx: &egui::Context) {
        if let Some(request) = self.orchestrator.retry() {
            self.dispatch(request, ctx);
        }
    }

    pub fn clear(&mut self) {
        info!("Resetting upload state");
        self.orchestrator.reset();
        self.view.reading_file = None;
        self.view.invalidate_all();
    }

    fn dispatch(&self, request: UploadRequest, ctx: &egui::Context) {
        let ctx = ctx.clone();
        worker::spawn_upload(
            &self.runtime,
            Arc::clone(&self.transport),
            request,
            self.sender.clone(),
            move || ctx.request_repaint(),
        );
    }

    /// Applies every completion that arrived since the last frame.
    pub fn update_state(&mut self) {
        while let Ok(event) = self.receiver.try_recv() {
            match event {
                AppEvent::FileRead { ticket, outcome } => {
                    if self.orchestrator.select(ticket, outcome) {
                        self.view.reading_file = None;
                        self.view.invalidate_all();
                    }
                }
                AppEvent::UploadFinished { ticket, outcome } => {
                    if self.orchestrator.complete_upload(ticket, outcome) {
                        self.view.invalidate_result();
                    }
                }
                AppEvent::Health { ticket, outcome } => {
                    self.view.finish_health_check(ticket, outcome);
                }
            }
        }
    }
}

impl App for SegmentationApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.update_state();
        self.render(ctx);
    }
}
