use crate::upload::types::{FileCandidate, ImageType, SelectedFile};
use crate::utils::data_uri::DataUri;
use tracing::{info, warn};

/// 16 MiB, the largest body the segmentation service will take.
pub const MAX_FILE_SIZE: u64 = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RejectionReason {
    #[error("Please select a valid image file (JPEG, PNG, GIF, BMP, or WebP)")]
    UnsupportedType,
    #[error("File size exceeds 16 MB. Please select a smaller image.")]
    TooLarge,
    #[error("Failed to read file. The file may be corrupted.")]
    Unreadable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted { file: SelectedFile, preview: String },
    Rejected(RejectionReason),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

/// Gatekeeper between the file picker and anything that touches the network.
pub struct FileAcceptor;

impl FileAcceptor {
    /// Runs every check from scratch: type, then size, then the read.
    pub async fn validate(candidate: &FileCandidate) -> ValidationOutcome {
        let media_type = match Self::check(candidate) {
            Ok(media_type) => media_type,
            Err(reason) => {
                warn!(file = %candidate.file_name, %reason, "File rejected");
                return ValidationOutcome::Rejected(reason);
            }
        };

        let bytes = match tokio::fs::read(&candidate.path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(file = %candidate.file_name, error = %e, "Failed to read file");
                return ValidationOutcome::Rejected(RejectionReason::Unreadable);
            }
        };

        // The file may have changed since it was stat'ed.
        let size = bytes.len() as u64;
        if size > MAX_FILE_SIZE {
            warn!(file = %candidate.file_name, size, "File grew past the size limit");
            return ValidationOutcome::Rejected(RejectionReason::TooLarge);
        }

        let preview = DataUri::encode(media_type.mime(), &bytes);
        info!(
            file = %candidate.file_name,
            size,
            mime = media_type.mime(),
            "File accepted"
        );

        ValidationOutcome::Accepted {
            file: SelectedFile {
                file_name: candidate.file_name.clone(),
                media_type,
                size,
                bytes,
            },
            preview,
        }
    }

    /// The synchronous part of validation; the first failing rule wins.
    pub fn check(candidate: &FileCandidate) -> Result<ImageType, RejectionReason> {
        let media_type =
            ImageType::from_mime(&candidate.declared_type).ok_or(RejectionReason::UnsupportedType)?;

        if candidate.size > MAX_FILE_SIZE {
            return Err(RejectionReason::TooLarge);
        }

        Ok(media_type)
    }
}
