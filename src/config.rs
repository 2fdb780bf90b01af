use clap::Parser;

/// Runtime settings for the segmentation client.
#[derive(Parser, Debug, Clone)]
#[command(name = "ultrasound_segmenter", about = "Fetal head ultrasound segmentation client")]
pub struct Config {
    /// Base URL of the segmentation service; `/upload` and `/health` are appended
    #[arg(long, env = "SEGMENTATION_API_URL", default_value = "http://127.0.0.1:5000/api")]
    pub api_url: String,

    /// Per-request timeout in seconds
    #[arg(long, env = "SEGMENTATION_TIMEOUT_SECS", default_value_t = 30)]
    pub timeout_secs: u64,

    /// Extra attempts for the health check before reporting the backend as down
    #[arg(long, env = "SEGMENTATION_HEALTH_RETRIES", default_value_t = 3)]
    pub health_retries: u32,
}

impl Config {
    pub fn base_url(&self) -> String {
        self.api_url.trim_end_matches('/').to_string()
    }
}

/// Initialize tracing for the desktop binary.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
