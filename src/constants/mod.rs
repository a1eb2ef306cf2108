use std::str::FromStr;

use crate::{
    api::error::SystemError,
    modules::video::model::{ThumbnailStorage, VideoUrlMode},
};

/// Thumbnail bodies above this are rejected while the field is read.
pub const MAX_THUMBNAIL_SIZE: usize = 10 << 20;
/// Whole-request ceiling for video uploads.
pub const MAX_VIDEO_UPLOAD_SIZE: usize = 1 << 30;
/// Lifetime of presigned GET URLs handed to clients.
pub const PRESIGNED_URL_EXPIRATION: std::time::Duration = std::time::Duration::from_secs(15 * 60);

pub struct Env {
    pub jwt_secret: String,
    pub database_url: String,
    pub frontend_url: String,
    pub public_base_url: String,
    pub assets_root: String,
    pub thumbnail_storage: ThumbnailStorage,
    pub s3_bucket: String,
    pub s3_region: String,
    pub s3_cf_distribution: Option<String>,
    pub video_url_mode: VideoUrlMode,
    pub video_fast_start: bool,
    pub ffmpeg_path: String,
    pub ffprobe_path: String,
    pub ip: String,
    pub port: u16,
}

fn required(key: &'static str) -> Result<String, SystemError> {
    std::env::var(key).map_err(|_| {
        SystemError::config(format!("{key} must be set in .env file or environment variable"))
    })
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parsed<T: FromStr>(key: &'static str, default: &str) -> Result<T, SystemError> {
    optional(key, default)
        .parse::<T>()
        .map_err(|_| SystemError::config(format!("{key} has an invalid value")))
}

impl Env {
    pub fn load() -> Result<Self, SystemError> {
        let jwt_secret = required("SECRET_KEY")?;
        let database_url = required("DATABASE_URL")?;
        let s3_bucket = required("S3_BUCKET")?;
        let s3_region = required("S3_REGION")?;

        let ip = optional("IP", "127.0.0.1");
        let port = parsed::<u16>("PORT", "8091")?;

        let frontend_url = optional("FRONTEND_URL", "http://localhost:5173");
        let public_base_url = optional("PUBLIC_BASE_URL", &format!("http://localhost:{port}"));
        let assets_root = optional("ASSETS_ROOT", "./assets");

        let thumbnail_storage = parsed::<ThumbnailStorage>("THUMBNAIL_STORAGE", "assets")?;
        let video_url_mode = parsed::<VideoUrlMode>("VIDEO_URL_MODE", "presigned")?;
        let video_fast_start = parsed::<bool>("VIDEO_FAST_START", "true")?;

        let s3_cf_distribution = std::env::var("S3_CF_DISTRO").ok().filter(|d| !d.is_empty());
        if video_url_mode == VideoUrlMode::Cdn && s3_cf_distribution.is_none() {
            return Err(SystemError::config("S3_CF_DISTRO must be set when VIDEO_URL_MODE=cdn"));
        }

        let ffmpeg_path = optional("FFMPEG_PATH", "ffmpeg");
        let ffprobe_path = optional("FFPROBE_PATH", "ffprobe");

        Ok(Env {
            jwt_secret,
            database_url,
            frontend_url,
            public_base_url,
            assets_root,
            thumbnail_storage,
            s3_bucket,
            s3_region,
            s3_cf_distribution,
            video_url_mode,
            video_fast_start,
            ffmpeg_path,
            ffprobe_path,
            ip,
            port,
        })
    }
}
