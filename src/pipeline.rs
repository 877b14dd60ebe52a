// markdown-pdf-converter/src/pipeline.rs

use crate::config::{ConversionConfig, ScratchConfig};
use crate::error::{ConversionError, Result};
use crate::gcs::StorageGateway;
use crate::models::{derive_base_name, StorageChangeEvent};
use crate::renderers::{MarkdownRenderer, PdfRenderer, StyleInjector};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// One conversion: where the source lives, where the PDF goes, and the
/// local files staged along the way.
#[derive(Debug)]
pub struct ConversionJob {
    pub source_bucket: String,
    pub source_key: String,
    pub destination_bucket: String,
    pub base_name: String,
    pub output_key: String,
    pub source_path: PathBuf,
    pub html_path: PathBuf,
    pub pdf_path: PathBuf,
    keep_artifacts: bool,
}

impl ConversionJob {
    pub fn new(
        source_bucket: &str,
        source_key: &str,
        destination_bucket: &str,
        extension: &str,
        scratch: &ScratchConfig,
    ) -> Result<Self> {
        let base_name = derive_base_name(source_key, extension).ok_or_else(|| {
            ConversionError::InvalidEvent(format!(
                "cannot derive an output name from '{}' with extension '{}'",
                source_key, extension
            ))
        })?;

        let local_source = file_component(source_key)?;
        let local_base = file_component(base_name)?;

        Ok(Self {
            source_bucket: source_bucket.to_string(),
            source_key: source_key.to_string(),
            destination_bucket: destination_bucket.to_string(),
            base_name: base_name.to_string(),
            output_key: format!("{}.pdf", base_name),
            source_path: scratch.dir.join(local_source),
            html_path: scratch.dir.join(format!("{}.html", local_base)),
            pdf_path: scratch.dir.join(format!("{}.pdf", local_base)),
            keep_artifacts: scratch.keep_artifacts,
        })
    }
}

fn file_component(key: &str) -> Result<&str> {
    Path::new(key)
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ConversionError::InvalidEvent(format!("no file name in '{}'", key)))
}

impl Drop for ConversionJob {
    fn drop(&mut self) {
        if self.keep_artifacts {
            return;
        }
        for path in [&self.source_path, &self.html_path, &self.pdf_path] {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    debug!(path = %path.display(), error = %e, "Failed to remove scratch file");
                }
            }
        }
    }
}

/// Orchestrates: metadata → download → markdown → style → pdf → upload.
pub struct ConversionPipeline {
    storage: Arc<dyn StorageGateway>,
    pdf_renderer: Arc<dyn PdfRenderer>,
    markdown_renderer: MarkdownRenderer,
    style_injector: StyleInjector,
    conversion: ConversionConfig,
    scratch: ScratchConfig,
}

impl ConversionPipeline {
    pub fn new(
        storage: Arc<dyn StorageGateway>,
        pdf_renderer: Arc<dyn PdfRenderer>,
        conversion: ConversionConfig,
        scratch: ScratchConfig,
    ) -> Self {
        Self {
            storage,
            pdf_renderer,
            markdown_renderer: MarkdownRenderer::new(),
            style_injector: StyleInjector::new(),
            conversion,
            scratch,
        }
    }

    pub fn source_extension(&self) -> &str {
        &self.conversion.source_extension
    }

    /// Runs one conversion. Failures are logged and never returned.
    #[instrument(skip(self, event, cancel), fields(
        bucket = %event.bucket,
        object = %event.object_name
    ))]
    pub async fn run(&self, event: &StorageChangeEvent, cancel: &CancellationToken) {
        info!("Starting PDF conversion");

        match self.convert(event, cancel).await {
            Ok(job) => {
                info!(
                    base_name = %job.base_name,
                    destination = %format!("{}/{}", job.destination_bucket, job.output_key),
                    "PDF conversion completed successfully"
                );
            }
            Err(e) => {
                error!(
                    bucket = %event.bucket,
                    object = %event.object_name,
                    error_type = e.error_type(),
                    error = %e,
                    "Error processing file {} in {}",
                    event.object_name,
                    event.bucket
                );
            }
        }
    }

    pub(crate) async fn convert(
        &self,
        event: &StorageChangeEvent,
        cancel: &CancellationToken,
    ) -> Result<ConversionJob> {
        // 1. Resolve destination
        let destination_bucket = self.conversion.resolve_output_bucket();
        info!(output_bucket = %destination_bucket, "Output bucket resolved");

        // 2. Scratch directory
        if !fs::try_exists(&self.scratch.dir).await? {
            info!(dir = %self.scratch.dir.display(), "Creating scratch directory");
        }
        fs::create_dir_all(&self.scratch.dir).await?;

        // 3. Canonical object name
        let metadata = until_cancelled(
            cancel,
            self.storage.get_metadata(&event.bucket, &event.object_name),
        )
        .await?;
        debug!(
            name = %metadata.name,
            size = metadata.size,
            content_type = ?metadata.content_type,
            "Fetched object metadata"
        );

        // 4. Local paths
        let job = ConversionJob::new(
            &event.bucket,
            &metadata.name,
            destination_bucket,
            &self.conversion.source_extension,
            &self.scratch,
        )?;

        // 5. Download
        let raw = until_cancelled(cancel, self.storage.download(&job.source_bucket, &job.source_key))
            .await?;
        fs::write(&job.source_path, &raw).await?;
        info!(
            object = %job.source_key,
            local = %job.source_path.display(),
            "Source downloaded"
        );

        // 6. Decode
        let markdown = String::from_utf8(fs::read(&job.source_path).await?)?;

        // 7-8. Markdown → HTML
        let fragment = self.markdown_renderer.render(&markdown);
        fs::write(&job.html_path, &fragment).await?;
        info!(local = %job.html_path.display(), "HTML saved");

        // 9. Style
        let styled = self.style_injector.wrap(&fragment);
        fs::write(&job.html_path, &styled).await?;

        // 10. HTML → PDF
        let pdf = self.pdf_renderer.render(&styled, &self.scratch.dir).await?;
        fs::write(&job.pdf_path, &pdf).await?;
        info!(local = %job.pdf_path.display(), "PDF generated");

        // 11. Upload, strictly last
        let data = fs::read(&job.pdf_path).await?;
        info!(
            destination = %format!("{}/{}", job.destination_bucket, job.output_key),
            "Uploading PDF"
        );
        until_cancelled(
            cancel,
            self.storage.upload(
                &job.destination_bucket,
                &job.output_key,
                PDF_CONTENT_TYPE,
                data,
            ),
        )
        .await?;

        Ok(job)
    }
}

async fn until_cancelled<T>(
    cancel: &CancellationToken,
    operation: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(ConversionError::Cancelled),
        result = operation => result,
    }
}
