// markdown-pdf-converter/src/renderers/pdf.rs

use crate::config::RendererConfig;
use crate::error::{ConversionError, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tempfile::Builder;
use tokio::fs;
use tokio::process::Command;
use tracing::{debug, info};

/// HTML to PDF conversion.
///
/// Relative resource references in `html` resolve against `base_dir`.
#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, html: &str, base_dir: &Path) -> Result<Vec<u8>>;
}

/// Shells out to `wkhtmltopdf` (or a compatible command).
pub struct WkhtmltopdfRenderer {
    command: String,
    timeout: Duration,
}

impl WkhtmltopdfRenderer {
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            command: config.pdf_command.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }
}

#[async_trait]
impl PdfRenderer for WkhtmltopdfRenderer {
    async fn render(&self, html: &str, base_dir: &Path) -> Result<Vec<u8>> {
        info!(command = %self.command, base_dir = %base_dir.display(), "Rendering PDF document");

        // Stage the input next to the other artifacts so relative URLs resolve there.
        let html_file = Builder::new()
            .prefix(".render-")
            .suffix(".html")
            .tempfile_in(base_dir)?;
        let pdf_file = Builder::new()
            .prefix(".render-")
            .suffix(".pdf")
            .tempfile_in(base_dir)?;

        fs::write(html_file.path(), html).await?;

        let mut cmd = Command::new(&self.command);
        cmd.arg("--quiet")
            .arg("--encoding")
            .arg("utf-8")
            .arg("--enable-local-file-access")
            .arg("--allow")
            .arg(base_dir)
            .arg(html_file.path())
            .arg(pdf_file.path())
            .kill_on_drop(true);

        debug!("Running PDF engine: {:?}", cmd);

        let output = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| {
                ConversionError::Render(format!(
                    "{} timed out after {}s",
                    self.command,
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| ConversionError::Render(format!("failed to run {}: {}", self.command, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ConversionError::Render(format!(
                "{} exited with {}: {}",
                self.command,
                output.status,
                stderr.trim()
            )));
        }

        let pdf_bytes = fs::read(pdf_file.path()).await?;
        if pdf_bytes.is_empty() {
            return Err(ConversionError::Render(format!(
                "{} produced an empty document",
                self.command
            )));
        }

        info!(size_kb = pdf_bytes.len() / 1024, "PDF generated successfully");

        Ok(pdf_bytes)
    }
}
