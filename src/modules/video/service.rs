use std::path::Path;
use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine};
use log::info;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::api::error;
use crate::constants::PRESIGNED_URL_EXPIRATION;
use crate::modules::media::{AspectRatio, MediaProcessor};
use crate::modules::storage::object_storage::{
    decode_object_ref, encode_object_ref, public_object_url, ObjectStorage,
};
use crate::modules::storage::AssetStore;
use crate::modules::video::{
    model::{CreateVideoModel, NewVideo, ThumbnailStorage, VideoConfig, VideoUrlMode},
    repository::VideoRepository,
    schema::VideoEntity,
};

pub const VIDEO_CONTENT_TYPE: &str = "video/mp4";

/// `<orientation>/<sha256 hex of a fresh uuid>.mp4`
pub fn storage_key(aspect: AspectRatio) -> String {
    let digest = Sha256::digest(Uuid::new_v4().to_string().as_bytes());
    format!("{}/{}.mp4", aspect, hex::encode(digest))
}

#[derive(Clone)]
pub struct VideoService {
    repo: Arc<dyn VideoRepository + Send + Sync>,
    storage: Arc<dyn ObjectStorage + Send + Sync>,
    media: Arc<dyn MediaProcessor + Send + Sync>,
    assets: AssetStore,
    config: VideoConfig,
}

impl VideoService {
    pub fn with_dependencies(
        repo: Arc<dyn VideoRepository + Send + Sync>,
        storage: Arc<dyn ObjectStorage + Send + Sync>,
        media: Arc<dyn MediaProcessor + Send + Sync>,
        assets: AssetStore,
        config: VideoConfig,
    ) -> Self {
        info!("VideoService initialized with {} video URLs", config.video_url_mode);
        VideoService { repo, storage, media, assets, config }
    }

    pub fn upload_limit(&self) -> usize {
        self.config.max_upload_size
    }

    pub async fn create(
        &self,
        user_id: Uuid,
        video: CreateVideoModel,
    ) -> Result<VideoEntity, error::SystemError> {
        let new_video = NewVideo {
            user_id,
            title: video.title,
            description: video.description.unwrap_or_default(),
        };
        let entity = self.repo.create(&new_video).await?;
        info!("Video {} created by user {}", entity.id, user_id);
        Ok(entity)
    }

    /// Fetches a video and checks that `user_id` owns it.
    pub async fn get_owned(
        &self,
        video_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<VideoEntity, error::SystemError> {
        let video = self
            .repo
            .find_by_id(video_id)
            .await?
            .ok_or_else(|| error::SystemError::not_found("Video not found"))?;

        if video.user_id != *user_id {
            return Err(error::SystemError::unauthorized("User doesn't have permission"));
        }
        Ok(video)
    }

    pub async fn get_video(
        &self,
        video_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<VideoEntity, error::SystemError> {
        let video = self.get_owned(video_id, user_id).await?;
        self.sign_video(video).await
    }

    pub async fn list_videos(&self, user_id: &Uuid) -> Result<Vec<VideoEntity>, error::SystemError> {
        let videos = self.repo.find_by_user(user_id).await?;
        futures_util::future::try_join_all(videos.into_iter().map(|v| self.sign_video(v))).await
    }

    pub async fn delete_video(
        &self,
        video_id: &Uuid,
        user_id: &Uuid,
    ) -> Result<(), error::SystemError> {
        self.get_owned(video_id, user_id).await?;
        if !self.repo.delete(video_id).await? {
            return Err(error::SystemError::not_found("Video not found"));
        }
        info!("Video {} deleted by user {}", video_id, user_id);
        Ok(())
    }

    /// Stores an already validated image and points the video at it.
    pub async fn upload_thumbnail(
        &self,
        video_id: &Uuid,
        user_id: &Uuid,
        media_type: &str,
        bytes: Vec<u8>,
    ) -> Result<VideoEntity, error::SystemError> {
        let mut video = self.get_owned(video_id, user_id).await?;

        let url = match self.config.thumbnail_storage {
            ThumbnailStorage::Assets => self.assets.save(media_type, &bytes).await?,
            ThumbnailStorage::DataUrl => {
                format!("data:{};base64,{}", media_type, STANDARD.encode(&bytes))
            }
        };

        video.thumbnail_url = Some(url);
        let updated = self.repo.update(&video).await?;
        info!("Thumbnail of video {} replaced ({} bytes)", video_id, bytes.len());

        self.sign_video(updated).await
    }

    /// Classifies, optionally remuxes and uploads the buffered file at `upload`,
    /// then records where it went. Ownership must already be checked.
    pub async fn upload_video(
        &self,
        mut video: VideoEntity,
        upload: &Path,
    ) -> Result<VideoEntity, error::SystemError> {
        let aspect = self.media.aspect_ratio(upload).await?;

        let processed = if self.config.fast_start {
            Some(self.media.fast_start(upload).await?)
        } else {
            None
        };
        let body = processed.as_deref().unwrap_or(upload);

        let key = storage_key(aspect);
        self.storage.put_object(&self.config.s3_bucket, &key, body, VIDEO_CONTENT_TYPE).await?;

        // No compensation: a failed update below leaves the object orphaned.
        video.video_url = Some(self.video_url_for(&key));
        let updated = self.repo.update(&video).await?;
        info!("Video {} uploaded to {}/{}", updated.id, self.config.s3_bucket, key);

        self.sign_video(updated).await
    }

    /// URL persisted on the record for an object stored under `key`.
    pub fn video_url_for(&self, key: &str) -> String {
        let bucket = &self.config.s3_bucket;
        match (self.config.video_url_mode, &self.config.s3_cf_distribution) {
            (VideoUrlMode::Presigned, _) => encode_object_ref(bucket, key),
            (VideoUrlMode::Cdn, Some(distribution)) => format!("https://{distribution}/{key}"),
            (VideoUrlMode::Cdn, None) | (VideoUrlMode::Public, _) => {
                public_object_url(bucket, &self.config.s3_region, key)
            }
        }
    }

    /// Swaps a stored `bucket,key` reference for a presigned GET URL.
    pub async fn sign_video(&self, mut video: VideoEntity) -> Result<VideoEntity, error::SystemError> {
        if self.config.video_url_mode != VideoUrlMode::Presigned {
            return Ok(video);
        }
        let Some(reference) = video.video_url.as_deref() else {
            return Ok(video);
        };
        let Some((bucket, key)) = decode_object_ref(reference) else {
            log::warn!("Video {} has a video URL that is not a bucket,key reference", video.id);
            return Ok(video);
        };

        let url = self.storage.presign_get(bucket, key, PRESIGNED_URL_EXPIRATION).await?;
        video.video_url = Some(url);
        Ok(video)
    }
}
