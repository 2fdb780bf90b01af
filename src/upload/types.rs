use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Raster formats the segmentation service accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageType {
    Jpeg,
    Png,
    Gif,
    Bmp,
    Webp,
}

impl ImageType {
    /// Resolves a declared media type against the allow-list.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/bmp" => Some(Self::Bmp),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Webp => "image/webp",
        }
    }
}

/// Media type a desktop file picker would report for the given file name.
pub fn declared_type_for(file_name: &str) -> String {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let mime = match extension.as_str() {
        "jpg" | "jpeg" | "jfif" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "webp" => "image/webp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "dcm" => "application/dicom",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    };
    mime.to_string()
}

/// A file the operator picked, before any validation has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCandidate {
    pub path: PathBuf,
    pub file_name: String,
    pub declared_type: String,
    pub size: u64,
}

impl FileCandidate {
    pub fn from_path(path: &Path) -> io::Result<Self> {
        let metadata = fs::metadata(path)?;
        let file_name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();

        Ok(Self {
            path: path.to_path_buf(),
            declared_type: declared_type_for(&file_name),
            file_name,
            size: metadata.len(),
        })
    }
}

/// A file that passed validation and whose bytes are ready to transmit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub file_name: String,
    pub media_type: ImageType,
    pub size: u64,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QualityMetrics {
    pub mask_area_ratio: f64,
    pub mask_circularity: f64,
    pub edge_sharpness: f64,
    pub is_valid_shape: bool,
}

/// Body of a successful `POST /upload`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SegmentationResult {
    pub success: bool,
    /// Base64 encoded image.
    pub original: String,
    /// Base64 encoded mask overlay.
    pub segmentation: String,
    /// Milliseconds.
    pub inference_time: f64,
    pub is_valid_ultrasound: bool,
    pub confidence_score: f64,
    pub quality_metrics: QualityMetrics,
    #[serde(default)]
    pub warnings: Vec<String>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub model_loaded: bool,
}
