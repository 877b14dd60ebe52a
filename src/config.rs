// markdown-pdf-converter/src/config.rs

use config::{Config as ConfigLoader, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;

/// Destination bucket used when nothing else is configured.
pub const DEFAULT_OUTPUT_BUCKET: &str = "file-pdf-test";

/// Legacy variable name kept for existing deployments.
const OUTPUT_BUCKET_ENV: &str = "OutputBucketNamePDF";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub pubsub: PubSubConfig,
    pub conversion: ConversionConfig,
    pub scratch: ScratchConfig,
    pub renderer: RendererConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceConfig {
    pub name: String,
    pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PubSubConfig {
    pub project_id: String,
    pub subscription: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConversionConfig {
    pub output_bucket: String,
    pub source_extension: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScratchConfig {
    pub dir: PathBuf,
    pub keep_artifacts: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RendererConfig {
    pub pdf_command: String,
    pub timeout_secs: u64,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let legacy_bucket = std::env::var(OUTPUT_BUCKET_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty());

        let config = ConfigLoader::builder()
            // Start with default values
            .set_default("service.name", "markdown-pdf-converter")?
            .set_default("service.log_level", "info")?
            .set_default("pubsub.project_id", "mcxtest")?
            .set_default("pubsub.subscription", "storage-notifications-sub")?
            .set_default("conversion.output_bucket", DEFAULT_OUTPUT_BUCKET)?
            .set_default("conversion.source_extension", ".txt")?
            .set_default("scratch.dir", "./pdfs")?
            .set_default("scratch.keep_artifacts", false)?
            .set_default("renderer.pdf_command", "wkhtmltopdf")?
            .set_default("renderer.timeout_secs", "60")?
            // Load from config file if it exists
            .add_source(File::with_name("config").required(false))
            // Override with environment variables (e.g., SERVICE__SCRATCH__DIR)
            .add_source(Environment::with_prefix("SERVICE").separator("__"))
            .set_override_option("conversion.output_bucket", legacy_bucket)?
            .build()?;

        config.try_deserialize()
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            output_bucket: DEFAULT_OUTPUT_BUCKET.to_string(),
            source_extension: ".txt".to_string(),
        }
    }
}

impl ConversionConfig {
    /// Destination bucket, falling back to the default when blank.
    pub fn resolve_output_bucket(&self) -> &str {
        let bucket = self.output_bucket.trim();
        if bucket.is_empty() {
            DEFAULT_OUTPUT_BUCKET
        } else {
            bucket
        }
    }
}

impl Default for ScratchConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("./pdfs"),
            keep_artifacts: false,
        }
    }
}
