use crate::upload::{classify, HealthStatus, RawFailure};
use derivative::Derivative;
use eframe::egui::{self, ColorImage, TextureHandle, TextureOptions};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HealthIndicator {
    #[default]
    Checking,
    Online {
        status: String,
        model_loaded: bool,
    },
    Unreachable(String),
}

impl HealthIndicator {
    pub fn from_outcome(outcome: Result<HealthStatus, RawFailure>) -> Self {
        match outcome {
            Ok(health) => Self::Online {
                status: health.status,
                model_loaded: health.model_loaded,
            },
            Err(failure) => Self::Unreachable(classify(&failure).message()),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Checking => "Checking backend...".to_string(),
            Self::Online {
                model_loaded: true, ..
            } => "Model loaded".to_string(),
            Self::Online { status, .. } => format!("Model not loaded ({})", status),
            Self::Unreachable(_) => "Backend unreachable".to_string(),
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(
            self,
            Self::Online {
                model_loaded: true,
                ..
            }
        )
    }
}

/// Tags a health check so only the most recent one updates the indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthTicket(u64);

/// A texture decoded on demand and kept until its source changes.
#[derive(Default)]
pub enum TextureSlot {
    #[default]
    Stale,
    Ready(TextureHandle),
    Unavailable,
}

impl TextureSlot {
    pub fn get_or_load(
        &mut self,
        ctx: &egui::Context,
        name: &str,
        bytes: impl FnOnce() -> Option<Vec<u8>>,
    ) -> Option<&TextureHandle> {
        if matches!(self, Self::Stale) {
            *self = match bytes().and_then(|bytes| decode_texture(ctx, name, &bytes)) {
                Some(texture) => Self::Ready(texture),
                None => Self::Unavailable,
            };
        }

        match self {
            Self::Ready(texture) => Some(&*texture),
            _ => None,
        }
    }

    pub fn invalidate(&mut self) {
        *self = Self::Stale;
    }
}

/// UI-only state; everything about the upload itself lives in the orchestrator.
#[derive(Derivative, Default)]
#[derivative(Debug)]
pub struct ViewState {
    pub health: HealthIndicator,
    health_seq: u64,
    pub reading_file: Option<String>,
    #[derivative(Debug = "ignore")]
    pub preview: TextureSlot,
    #[derivative(Debug = "ignore")]
    pub original: TextureSlot,
    #[derivative(Debug = "ignore")]
    pub segmentation: TextureSlot,
}

impl ViewState {
    pub fn begin_health_check(&mut self) -> HealthTicket {
        self.health_seq += 1;
        self.health = HealthIndicator::Checking;
        HealthTicket(self.health_seq)
    }

    /// Returns false when a newer check has started since `ticket` was issued.
    pub fn finish_health_check(
        &mut self,
        ticket: HealthTicket,
        outcome: Result<HealthStatus, RawFailure>,
    ) -> bool {
        if ticket != HealthTicket(self.health_seq) {
            debug!(?ticket, "Dropping superseded health check");
            return false;
        }
        self.health = HealthIndicator::from_outcome(outcome);
        true
    }

    pub fn invalidate_result(&mut self) {
        self.original.invalidate();
        self.segmentation.invalidate();
    }

    pub fn invalidate_all(&mut self) {
        self.preview.invalidate();
        self.invalidate_result();
    }
}

fn decode_texture(ctx: &egui::Context, name: &str, bytes: &[u8]) -> Option<TextureHandle> {
    let decoded = match image::load_from_memory(bytes) {
        Ok(decoded) => decoded,
        Err(e) => {
            warn!(texture = name, error = %e, "Failed to decode image");
            return None;
        }
    };

    let rgba = decoded.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];
    let image = ColorImage::from_rgba_unmultiplied(size, rgba.as_raw());
    Some(ctx.load_texture(name, image, TextureOptions::LINEAR))
}
