// markdown-pdf-converter/src/main.rs

mod config;
mod error;
mod gcs;
mod models;
mod pipeline;
mod pubsub;
mod renderers;

#[cfg(test)]
mod test_support;

use crate::config::Config;
use crate::gcs::GcsStorage;
use crate::pipeline::ConversionPipeline;
use crate::pubsub::{Delivery, EventDispatcher};
use crate::renderers::WkhtmltopdfRenderer;
use google_cloud_pubsub::client::{Client, ClientConfig};
use google_cloud_pubsub::subscription::Subscription;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Print to stderr BEFORE logging initialization to catch early failures
    eprintln!("Starting markdown-pdf-converter...");

    let config = match Config::load() {
        Ok(cfg) => {
            eprintln!("Configuration loaded successfully");
            cfg
        }
        Err(e) => {
            eprintln!("FATAL: Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.service.log_level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!(
        service = %config.service.name,
        version = env!("CARGO_PKG_VERSION"),
        output_bucket = %config.conversion.resolve_output_bucket(),
        scratch_dir = %config.scratch.dir.display(),
        "Starting Markdown to PDF converter"
    );

    let storage = match GcsStorage::new().await {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to create GCS client: {:#}", e);
            eprintln!("FATAL: Failed to create GCS client: {:#}", e);
            return Err(e.into());
        }
    };

    let client_config = match ClientConfig::default().with_auth().await {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Failed to create Pub/Sub client config: {}", e);
            eprintln!("FATAL: Failed to create Pub/Sub client config: {}", e);
            return Err(e.into());
        }
    };

    let client = match Client::new(client_config).await {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to create Pub/Sub client: {}", e);
            eprintln!("FATAL: Failed to create Pub/Sub client: {}", e);
            return Err(e.into());
        }
    };

    info!(
        project_id = %config.pubsub.project_id,
        subscription = %config.pubsub.subscription,
        "Initializing Pub/Sub subscription"
    );

    let subscription = client.subscription(&config.pubsub.subscription);

    let pipeline = ConversionPipeline::new(
        Arc::new(storage),
        Arc::new(WkhtmltopdfRenderer::new(&config.renderer)),
        config.conversion.clone(),
        config.scratch.clone(),
    );
    let dispatcher = Arc::new(EventDispatcher::new(pipeline));

    process_messages(subscription, dispatcher).await;

    Ok(())
}

async fn process_messages(subscription: Subscription, dispatcher: Arc<EventDispatcher>) {
    use tokio::signal;
    use tokio_util::sync::CancellationToken;

    let cancel = CancellationToken::new();
    let cancel_for_signal = cancel.clone();

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                info!("Received shutdown signal, cancelling message processing");
                cancel_for_signal.cancel();
            }
            Err(err) => {
                error!("Unable to listen for shutdown signal: {}", err);
            }
        }
    });

    info!("Waiting for storage notifications");

    loop {
        if cancel.is_cancelled() {
            info!("Shutdown requested, no longer pulling notifications");
            break;
        }

        let dispatcher_clone = dispatcher.clone();

        let result = subscription
            .receive(
                move |message, cancel| {
                    let dispatcher = dispatcher_clone.clone();

                    async move {
                        if cancel.is_cancelled() {
                            return;
                        }

                        info!(
                            message_id = %message.message.message_id,
                            "Processing storage notification"
                        );

                        let message_id = message.message.message_id.clone();
                        match dispatcher.handle_message(&message.message, &cancel).await {
                            // Failures are contained by the pipeline, so handled messages are acked.
                            Delivery::Ack => {
                                if let Err(e) = message.ack().await {
                                    error!(
                                        message_id = %message_id,
                                        error = %e,
                                        "Failed to acknowledge message"
                                    );
                                } else {
                                    info!(message_id = %message_id, "Notification acknowledged");
                                }
                            }
                            Delivery::Redeliver => {
                                if let Err(e) = message.nack().await {
                                    error!(
                                        message_id = %message_id,
                                        error = %e,
                                        "Failed to nack interrupted message"
                                    );
                                }
                            }
                        }
                    }
                },
                cancel.clone(),
                None,
            )
            .await;

        if let Err(e) = result {
            error!(error = %e, "Subscription stream failed, reconnecting in 5 seconds");
            tokio::time::sleep(tokio::time::Duration::from_secs(5)).await;
        }
    }

    info!("Notification consumer stopped");
}
