use crate::upload::{ConfidenceTier, WarningSeverity};
use eframe::egui::Color32;

pub const SUCCESS: Color32 = Color32::from_rgb(22, 163, 74);
pub const WARNING: Color32 = Color32::from_rgb(202, 138, 4);
pub const ERROR: Color32 = Color32::from_rgb(220, 38, 38);
pub const MUTED: Color32 = Color32::from_rgb(107, 114, 128);

pub fn tier_color(tier: ConfidenceTier) -> Color32 {
    match tier {
        ConfidenceTier::High => SUCCESS,
        ConfidenceTier::Medium => WARNING,
        ConfidenceTier::Low => ERROR,
    }
}

pub fn severity_color(severity: WarningSeverity) -> Color32 {
    match severity {
        WarningSeverity::Warning => WARNING,
        WarningSeverity::Error => ERROR,
    }
}
