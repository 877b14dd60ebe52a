// markdown-pdf-converter/src/pubsub/handler.rs

use crate::models::StorageChangeEvent;
use crate::pipeline::ConversionPipeline;
use google_cloud_googleapis::pubsub::v1::PubsubMessage;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// What the subscriber should do with a message once it has been handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handled to completion, including contained failures.
    Ack,
    /// Interrupted by shutdown; leave it for the platform to redeliver.
    Redeliver,
}

/// Trigger entry point: filters storage notifications and runs the pipeline
/// for completed uploads of source documents.
pub struct EventDispatcher {
    pipeline: ConversionPipeline,
}

impl EventDispatcher {
    pub fn new(pipeline: ConversionPipeline) -> Self {
        Self { pipeline }
    }

    pub async fn handle_message(
        &self,
        message: &PubsubMessage,
        cancel: &CancellationToken,
    ) -> Delivery {
        let event = match StorageChangeEvent::from_pubsub(message) {
            Ok(event) => event,
            Err(e) => {
                warn!(
                    message_id = %message.message_id,
                    error_type = e.error_type(),
                    error = %e,
                    "Rejected malformed storage notification"
                );
                return Delivery::Ack;
            }
        };

        self.handle(&event, cancel).await;

        if cancel.is_cancelled() {
            warn!(
                message_id = %message.message_id,
                object = %event.object_name,
                "Conversion interrupted by shutdown, leaving message for redelivery"
            );
            return Delivery::Redeliver;
        }
        Delivery::Ack
    }

    pub async fn handle(&self, event: &StorageChangeEvent, cancel: &CancellationToken) {
        info!(
            name = %event.object_name,
            bucket = %event.bucket,
            size = ?event.size,
            content_type = ?event.content_type,
            "Storage object information"
        );
        info!(
            id = %event.event_id,
            source = %event.event_source,
            event_type = %event.event_type_raw,
            time = ?event.event_time.map(|t| t.to_rfc3339()),
            payload_format = ?event.payload_format,
            notification_config = ?event.notification_config,
            generation = ?event.object_generation,
            "Storage event information"
        );

        if !event.event_type.is_finalized() {
            info!(
                event_type = %event.event_type_raw,
                "Object not finalized, skipping PDF conversion"
            );
            return;
        }

        let extension = self.pipeline.source_extension();
        if !event.object_name.ends_with(extension) {
            info!(
                object = %event.object_name,
                extension = %extension,
                "Object does not have the source extension, skipping PDF conversion"
            );
            return;
        }

        self.pipeline.run(event, cancel).await;
    }
}
