use anyhow::Context;
use clap::Parser;
use eframe::CreationContext;
use std::sync::Arc;
use tokio::runtime::Runtime;
use ultrasound_segmenter::app::SegmentationApp;
use ultrasound_segmenter::config::{init_tracing, Config};
use ultrasound_segmenter::upload::SegmentationClient;

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = Config::parse();
    tracing::info!(api_url = %config.base_url(), timeout_secs = config.timeout_secs, "Starting");

    let runtime = Runtime::new().context("Failed to start async runtime")?;
    let transport =
        Arc::new(SegmentationClient::new(&config).context("Failed to create HTTP client")?);
    let handle = runtime.handle().clone();

    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default()
            .with_inner_size([760.0, 900.0])
            .with_min_inner_size([480.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Fetal Head Segmentation",
        options,
        Box::new(move |cc: &CreationContext| {
            Box::new(SegmentationApp::new(cc, transport, handle))
        }),
    )
    .map_err(|e| anyhow::anyhow!("Failed to open window: {}", e))
}
