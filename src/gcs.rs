use crate::error::{ConversionError, Result};
use crate::models::ObjectMetadata;
use anyhow::Context;
use async_trait::async_trait;
use google_cloud_storage::client::{Client as GcsClient, ClientConfig};
use google_cloud_storage::http::objects::download::Range;
use google_cloud_storage::http::objects::get::GetObjectRequest;
use google_cloud_storage::http::objects::upload::{Media, UploadObjectRequest, UploadType};
use sha2::{Digest, Sha256};
use tracing::{info, instrument};

/// Object storage operations the pipeline depends on.
#[async_trait]
pub trait StorageGateway: Send + Sync {
    async fn get_metadata(&self, bucket: &str, object: &str) -> Result<ObjectMetadata>;

    async fn download(&self, bucket: &str, object: &str) -> Result<Vec<u8>>;

    async fn upload(
        &self,
        bucket: &str,
        object: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<()>;
}

#[derive(Clone)]
pub struct GcsStorage {
    client: GcsClient,
}

impl GcsStorage {
    /// Initialise from the ambient service account credentials.
    pub async fn new() -> anyhow::Result<Self> {
        let config = ClientConfig::default()
            .with_auth()
            .await
            .context("Failed to initialise GCS client with service account")?;

        Ok(Self {
            client: GcsClient::new(config),
        })
    }

    fn object_request(bucket: &str, object: &str) -> GetObjectRequest {
        GetObjectRequest {
            bucket: bucket.to_string(),
            object: object.to_string(),
            ..Default::default()
        }
    }
}

#[async_trait]
impl StorageGateway for GcsStorage {
    #[instrument(skip(self))]
    async fn get_metadata(&self, bucket: &str, object: &str) -> Result<ObjectMetadata> {
        let found = self
            .client
            .get_object(&Self::object_request(bucket, object))
            .await
            .map_err(|e| ConversionError::Metadata {
                bucket: bucket.to_string(),
                object: object.to_string(),
                reason: e.to_string(),
            })?;

        Ok(ObjectMetadata {
            name: found.name,
            size: found.size.max(0) as u64,
            content_type: found.content_type,
        })
    }

    #[instrument(skip(self))]
    async fn download(&self, bucket: &str, object: &str) -> Result<Vec<u8>> {
        self.client
            .download_object(&Self::object_request(bucket, object), &Range::default())
            .await
            .map_err(|e| ConversionError::Download {
                bucket: bucket.to_string(),
                object: object.to_string(),
                reason: e.to_string(),
            })
    }

    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn upload(
        &self,
        bucket: &str,
        object: &str,
        content_type: &str,
        data: Vec<u8>,
    ) -> Result<()> {
        let file_size = data.len();
        let sha256_checksum = hex::encode(Sha256::digest(&data));

        let upload_type = UploadType::Simple(Media {
            name: object.to_string().into(),
            content_type: content_type.to_string().into(),
            content_length: Some(file_size as u64),
        });

        self.client
            .upload_object(
                &UploadObjectRequest {
                    bucket: bucket.to_string(),
                    ..Default::default()
                },
                data,
                &upload_type,
            )
            .await
            .map_err(|e| ConversionError::Upload {
                bucket: bucket.to_string(),
                object: object.to_string(),
                reason: e.to_string(),
            })?;

        info!(
            bucket = %bucket,
            object = %object,
            file_size = file_size,
            sha256 = %sha256_checksum,
            "Uploaded object to GCS"
        );

        Ok(())
    }
}
