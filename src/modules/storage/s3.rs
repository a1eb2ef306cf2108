use std::{path::Path, time::Duration};

use aws_config::BehaviorVersion;
use aws_sdk_s3::{presigning::PresigningConfig, primitives::ByteStream, Client};

use crate::{api::error, modules::storage::object_storage::ObjectStorage};

/// S3 storage backed by the default AWS credential chain.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
}

impl S3Storage {
    pub async fn new(region: &str) -> Self {
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(aws_config::Region::new(region.to_string()))
            .load()
            .await;

        log::info!("S3 client initialized for region {region}");
        Self { client: Client::new(&config) }
    }
}

#[async_trait::async_trait]
impl ObjectStorage for S3Storage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &Path,
        content_type: &str,
    ) -> Result<(), error::SystemError> {
        let start = std::time::Instant::now();
        let stream = ByteStream::from_path(body).await.map_err(|e| {
            error::SystemError::storage(format!("failed to open {}: {e}", body.display()))
        })?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(stream)
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| {
                log::error!("S3 upload of {bucket}/{key} failed: {e:?}");
                error::SystemError::storage(format!("S3 upload failed: {e}"))
            })?;

        log::info!(
            "S3 upload of {bucket}/{key} finished in {:.1}ms",
            start.elapsed().as_secs_f64() * 1000.0
        );
        Ok(())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, error::SystemError> {
        let presigning_config = PresigningConfig::expires_in(expires_in)
            .map_err(|e| error::SystemError::storage(e.to_string()))?;

        let request = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning_config)
            .await
            .map_err(|e| error::SystemError::storage(format!("S3 presign failed: {e}")))?;

        Ok(request.uri().to_string())
    }
}
