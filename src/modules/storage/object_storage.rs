use std::{path::Path, time::Duration};

use crate::api::error;

#[async_trait::async_trait]
pub trait ObjectStorage {
    /// Uploads the file at `body` to `bucket/key`.
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &Path,
        content_type: &str,
    ) -> Result<(), error::SystemError>;

    /// Time-limited GET URL for a private object.
    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, error::SystemError>;
}

/// Compact `bucket,key` reference stored on records in presigned mode.
pub fn encode_object_ref(bucket: &str, key: &str) -> String {
    format!("{bucket},{key}")
}

pub fn decode_object_ref(reference: &str) -> Option<(&str, &str)> {
    let (bucket, key) = reference.split_once(',')?;
    if bucket.is_empty() || key.is_empty() || key.contains(',') {
        return None;
    }
    Some((bucket, key))
}

pub fn public_object_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{bucket}.s3.{region}.amazonaws.com/{key}")
}
