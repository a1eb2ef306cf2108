use std::{fmt, str::FromStr};

use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::constants::{Env, MAX_VIDEO_UPLOAD_SIZE};

#[derive(Deserialize, Validate)]
pub struct CreateVideoModel {
    #[validate(length(min = 1, max = 255, message = "Title must be between 1 and 255 characters"))]
    pub title: String,
    #[validate(length(max = 5000, message = "Description cannot exceed 5000 characters"))]
    pub description: Option<String>,
}

/// New video draft to insert into database
#[derive(Debug, Clone)]
pub struct NewVideo {
    pub user_id: Uuid,
    pub title: String,
    pub description: String,
}

/// Where uploaded thumbnails end up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbnailStorage {
    /// Written under the assets directory and served from `/assets`.
    Assets,
    /// Inlined into the record as a `data:` URL.
    DataUrl,
}

impl FromStr for ThumbnailStorage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "assets" => Ok(Self::Assets),
            "data_url" | "data-url" => Ok(Self::DataUrl),
            other => Err(format!("unknown thumbnail storage '{other}'")),
        }
    }
}

/// How the video URL written onto a record is shaped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoUrlMode {
    /// `https://<bucket>.s3.<region>.amazonaws.com/<key>`
    Public,
    /// `https://<distribution>/<key>`
    Cdn,
    /// `<bucket>,<key>`, exchanged for a presigned URL whenever the record is read.
    Presigned,
}

impl FromStr for VideoUrlMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "public" => Ok(Self::Public),
            "cdn" => Ok(Self::Cdn),
            "presigned" => Ok(Self::Presigned),
            other => Err(format!("unknown video url mode '{other}'")),
        }
    }
}

impl fmt::Display for VideoUrlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Public => "public",
            Self::Cdn => "cdn",
            Self::Presigned => "presigned",
        };
        f.write_str(s)
    }
}

/// Video upload configuration
#[derive(Debug, Clone)]
pub struct VideoConfig {
    pub thumbnail_storage: ThumbnailStorage,
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_cf_distribution: Option<String>,
    pub video_url_mode: VideoUrlMode,
    pub fast_start: bool,
    /// Ceiling on a whole video upload request body, in bytes.
    pub max_upload_size: usize,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            thumbnail_storage: ThumbnailStorage::Assets,
            s3_bucket: "tubely".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_cf_distribution: None,
            video_url_mode: VideoUrlMode::Presigned,
            fast_start: true,
            max_upload_size: MAX_VIDEO_UPLOAD_SIZE,
        }
    }
}

impl From<&Env> for VideoConfig {
    fn from(env: &Env) -> Self {
        Self {
            thumbnail_storage: env.thumbnail_storage,
            s3_bucket: env.s3_bucket.clone(),
            s3_region: env.s3_region.clone(),
            s3_cf_distribution: env.s3_cf_distribution.clone(),
            video_url_mode: env.video_url_mode,
            fast_start: env.video_fast_start,
            max_upload_size: MAX_VIDEO_UPLOAD_SIZE,
        }
    }
}
