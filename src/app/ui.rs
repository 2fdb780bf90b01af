use super::{HealthIndicator, SegmentationApp, TextureSlot, ViewState};
use crate::upload::{
    confidence_tier, warning_panel, RetryAvailability, SegmentationResult, UploadOrchestrator,
};
use crate::utils::data_uri::DataUri;
use crate::utils::format::FormatUtils;
use crate::utils::palette;
use eframe::egui::{self, Color32, RichText, Stroke};
use rfd::FileDialog;

const IMAGE_EXTENSIONS: [&str; 7] = ["jpg", "jpeg", "png", "gif", "bmp", "webp", "jfif"];

enum Action {
    ChooseFile,
    Submit,
    Retry,
    Clear,
    RefreshHealth,
}

impl SegmentationApp {
    pub fn render(&mut self, ctx: &egui::Context) {
        let mut action = None;

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            render_header(ui, &self.view.health, &mut action);
        });

        egui::TopBottomPanel::bottom("footer").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.add_space(4.0);
                ui.label(RichText::new("Fetal Head Segmentation").color(palette::MUTED));
                ui.add_space(4.0);
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                render_upload(ui, &self.orchestrator, &mut self.view, &mut action);
            });
        });

        match action {
            Some(Action::ChooseFile) => {
                if let Some(path) = FileDialog::new()
                    .add_filter("Images", &IMAGE_EXTENSIONS)
                    .add_filter("All files", &["*"])
                    .pick_file()
                {
                    self.load_file(path, ctx);
                }
            }
            Some(Action::Submit) => self.submit(ctx),
            Some(Action::Retry) => self.retry(ctx),
            Some(Action::Clear) => self.clear(),
            Some(Action::RefreshHealth) => self.check_health(ctx),
            None => {}
        }
    }
}

fn render_header(ui: &mut egui::Ui, health: &HealthIndicator, action: &mut Option<Action>) {
    ui.add_space(10.0);
    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            ui.heading("Fetal Head Segmentation");
            ui.label(RichText::new("AI-powered ultrasound analysis").color(palette::MUTED));
        });

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.small_button("⟳").on_hover_text("Check again").clicked() {
                *action = Some(Action::RefreshHealth);
            }

            let color = match health {
                HealthIndicator::Checking => palette::MUTED,
                _ if health.is_ready() => palette::SUCCESS,
                HealthIndicator::Online { .. } => palette::WARNING,
                HealthIndicator::Unreachable(_) => palette::ERROR,
            };
            let label = ui.colored_label(color, format!("● {}", health.label()));
            if let HealthIndicator::Unreachable(reason) = health {
                label.on_hover_text(reason.as_str());
            }
        });
    });
    ui.add_space(10.0);
}

fn render_upload(
    ui: &mut egui::Ui,
    orchestrator: &UploadOrchestrator,
    view: &mut ViewState,
    action: &mut Option<Action>,
) {
    ui.add_space(12.0);
    ui.heading("Upload Ultrasound Image");
    ui.label(
        RichText::new("Upload a fetal head ultrasound image for segmentation analysis")
            .color(palette::MUTED),
    );
    ui.add_space(10.0);

    render_guidelines(ui);
    ui.add_space(10.0);

    let ctx = ui.ctx().clone();
    if let Some(texture) = view.preview.get_or_load(&ctx, "preview", || {
        orchestrator.preview().and_then(DataUri::decode)
    }) {
        show_texture(ui, texture, 384.0);
        ui.add_space(6.0);
    }

    if let Some(file) = orchestrator.state().file() {
        ui.label(format!(
            "{} ({})",
            file.file_name,
            FormatUtils::format_size(file.size)
        ));
    }

    if let Some(name) = &view.reading_file {
        ui.horizontal(|ui| {
            ui.spinner();
            ui.label(format!("Reading {}...", name));
        });
    }

    if let Some(reason) = orchestrator.file_error() {
        alert(ui, palette::ERROR, "Invalid File Type", |ui| {
            ui.label(reason.to_string());
        });
    }

    ui.add_space(8.0);
    ui.horizontal(|ui| {
        if ui
            .add(egui::Button::new("📁 Choose Image").min_size(egui::vec2(160.0, 36.0)))
            .clicked()
        {
            *action = Some(Action::ChooseFile);
        }

        if orchestrator.is_pending() {
            ui.add_enabled(
                false,
                egui::Button::new("Processing...").min_size(egui::vec2(160.0, 36.0)),
            );
            ui.spinner();
        } else if ui
            .add_enabled(
                orchestrator.can_submit(),
                egui::Button::new("Segment Image").min_size(egui::vec2(160.0, 36.0)),
            )
            .clicked()
        {
            *action = Some(Action::Submit);
        }

        if orchestrator.state().file().is_some()
            && !orchestrator.is_pending()
            && ui.button("🗑 Clear").clicked()
        {
            *action = Some(Action::Clear);
        }
    });
    ui.add_space(10.0);

    if let Some(result) = orchestrator.result() {
        render_result(ui, &ctx, result, view);
    }

    if let Some(message) = orchestrator.error_message() {
        alert(ui, palette::ERROR, "Error Processing Image", |ui| {
            ui.label(message);
            match orchestrator.retry_availability() {
                Some(retry @ RetryAvailability::Available { .. }) => {
                    ui.horizontal(|ui| {
                        if ui.button("Retry Upload").clicked() {
                            *action = Some(Action::Retry);
                        }
                        ui.label(RichText::new(retry.message()).small().color(palette::MUTED));
                    });
                }
                Some(exhausted @ RetryAvailability::Exhausted) => {
                    ui.label(RichText::new(exhausted.message()).small().color(palette::MUTED));
                }
                None => {}
            }
        });
    }
}

fn render_guidelines(ui: &mut egui::Ui) {
    egui::CollapsingHeader::new("ℹ Image Guidelines")
        .default_open(false)
        .show(ui, |ui| {
            ui.columns(2, |columns| {
                columns[0].label(RichText::new("✔ Upload these:").strong().color(palette::SUCCESS));
                for item in [
                    "Fetal head ultrasound scans",
                    "2D B-mode ultrasound images",
                    "Clear head circumference views",
                    "Common image formats (JPEG, PNG, BMP)",
                ] {
                    columns[0].label(format!("• {}", item));
                }

                columns[1].label(RichText::new("✖ Avoid these:").strong().color(palette::ERROR));
                for item in [
                    "Regular photos or screenshots",
                    "Non-medical images",
                    "3D/4D ultrasound renders",
                    "Other body part scans",
                ] {
                    columns[1].label(format!("• {}", item));
                }
            });
        });
}

fn render_result(
    ui: &mut egui::Ui,
    ctx: &egui::Context,
    result: &SegmentationResult,
    view: &mut ViewState,
) {
    if let Some(panel) = warning_panel(result) {
        alert(ui, palette::severity_color(panel.severity), "Validation Warnings", |ui| {
            for warning in panel.warnings {
                ui.label(format!("• {}", warning));
            }
        });
        ui.add_space(8.0);
    }

    let tier = confidence_tier(result.confidence_score);
    egui::Frame::none()
        .fill(ui.visuals().faint_bg_color)
        .rounding(6.0)
        .inner_margin(10.0)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(RichText::new("Ultrasound Confidence").strong());
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    ui.label(
                        RichText::new(tier.label())
                            .color(Color32::WHITE)
                            .background_color(palette::tier_color(tier)),
                    );
                    ui.monospace(FormatUtils::format_percent(result.confidence_score));
                });
            });
        });
    ui.add_space(8.0);

    let metrics = &result.quality_metrics;
    egui::Grid::new("quality_metrics")
        .num_columns(2)
        .spacing([24.0, 6.0])
        .show(ui, |ui| {
            ui.label("Mask Coverage");
            ui.monospace(FormatUtils::format_percent(metrics.mask_area_ratio));
            ui.end_row();

            ui.label("Shape Quality");
            ui.monospace(FormatUtils::format_percent(metrics.mask_circularity));
            ui.end_row();

            ui.label("Edge Sharpness");
            ui.monospace(FormatUtils::format_percent(metrics.edge_sharpness));
            ui.end_row();

            ui.label("Valid Shape");
            if metrics.is_valid_shape {
                ui.colored_label(palette::SUCCESS, "✔ Yes");
            } else {
                ui.colored_label(palette::WARNING, "⚠ No");
            }
            ui.end_row();
        });
    ui.add_space(12.0);

    ui.columns(2, |columns| {
        result_image(&mut columns[0], ctx, "Original", &mut view.original, &result.original);
        result_image(
            &mut columns[1],
            ctx,
            "Segmentation",
            &mut view.segmentation,
            &result.segmentation,
        );
    });

    ui.add_space(6.0);
    ui.vertical_centered(|ui| {
        ui.label(
            RichText::new(format!("Processed in {}ms", result.inference_time))
                .color(palette::MUTED),
        );
    });
}

fn result_image(
    ui: &mut egui::Ui,
    ctx: &egui::Context,
    title: &str,
    slot: &mut TextureSlot,
    encoded: &str,
) {
    ui.label(RichText::new(title).strong());
    let width = ui.available_width();
    match slot.get_or_load(ctx, title, || DataUri::decode(encoded)) {
        Some(texture) => show_texture(ui, texture, width),
        None => {
            ui.colored_label(palette::MUTED, "Image could not be decoded");
        }
    }
}

fn show_texture(ui: &mut egui::Ui, texture: &egui::TextureHandle, max_width: f32) {
    let size = texture.size_vec2();
    let scale = (max_width / size.x).min(1.0);
    ui.add(egui::Image::new(egui::load::SizedTexture::new(
        texture.id(),
        size * scale,
    )));
}

fn alert(ui: &mut egui::Ui, color: Color32, title: &str, body: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .stroke(Stroke::new(1.0, color))
        .rounding(6.0)
        .inner_margin(10.0)
        .show(ui, |ui| {
            ui.set_width(ui.available_width());
            ui.label(RichText::new(title).strong().color(color));
            ui.add_space(4.0);
            body(ui);
        });
}
