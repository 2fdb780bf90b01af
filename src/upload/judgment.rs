use crate::upload::types::SegmentationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High Confidence",
            Self::Medium => "Medium Confidence",
            Self::Low => "Low Confidence",
        }
    }
}

pub fn confidence_tier(score: f64) -> ConfidenceTier {
    if score >= 0.70 {
        ConfidenceTier::High
    } else if score >= 0.40 {
        ConfidenceTier::Medium
    } else {
        ConfidenceTier::Low
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningSeverity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WarningPanel<'a> {
    pub severity: WarningSeverity,
    pub warnings: &'a [String],
}

/// Warnings on a plausible ultrasound are advisory; on an implausible one they are alarming.
pub fn warning_panel(result: &SegmentationResult) -> Option<WarningPanel<'_>> {
    if result.warnings.is_empty() {
        return None;
    }

    let severity = if result.is_valid_ultrasound {
        WarningSeverity::Warning
    } else {
        WarningSeverity::Error
    };

    Some(WarningPanel {
        severity,
        warnings: &result.warnings,
    })
}
