//! In-memory collaborators and request builders for handler tests.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use actix_web::{
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    web, App,
};
use tempfile::{TempDir, TempPath};
use uuid::Uuid;

use crate::{
    api::error,
    configs::AuthConfig,
    modules::{
        media::{AspectRatio, MediaProcessor},
        storage::{AssetStore, ObjectStorage},
        video::{
            model::{NewVideo, VideoConfig},
            repository::VideoRepository,
            schema::VideoEntity,
            service::VideoService,
        },
    },
    utils::Claims,
};

pub const TEST_SECRET: &str = "tubely-test-secret";
pub const MULTIPART_BOUNDARY: &str = "----tubely-test-boundary";

#[derive(Default)]
pub struct MemoryVideoRepository {
    videos: Mutex<HashMap<Uuid, VideoEntity>>,
    reads: AtomicUsize,
    fail_updates: AtomicBool,
}

impl MemoryVideoRepository {
    pub fn insert(&self, video: VideoEntity) -> VideoEntity {
        self.videos.lock().unwrap().insert(video.id, video.clone());
        video
    }

    pub fn get(&self, id: &Uuid) -> Option<VideoEntity> {
        self.videos.lock().unwrap().get(id).cloned()
    }

    /// Number of lookups served, to prove a handler bailed out early.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    pub fn fail_updates(&self) {
        self.fail_updates.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl VideoRepository for MemoryVideoRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<VideoEntity>, error::SystemError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(self.get(id))
    }

    async fn find_by_user(&self, user_id: &Uuid) -> Result<Vec<VideoEntity>, error::SystemError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let mut videos: Vec<_> = self
            .videos
            .lock()
            .unwrap()
            .values()
            .filter(|v| v.user_id == *user_id)
            .cloned()
            .collect();
        videos.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(videos)
    }

    async fn create(&self, video: &NewVideo) -> Result<VideoEntity, error::SystemError> {
        let now = chrono::Utc::now();
        Ok(self.insert(VideoEntity {
            id: Uuid::new_v4(),
            user_id: video.user_id,
            title: video.title.clone(),
            description: video.description.clone(),
            thumbnail_url: None,
            video_url: None,
            created_at: now,
            updated_at: now,
        }))
    }

    async fn update(&self, video: &VideoEntity) -> Result<VideoEntity, error::SystemError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(error::SystemError::DatabaseError("connection reset".into()));
        }
        let mut videos = self.videos.lock().unwrap();
        let stored = videos
            .get_mut(&video.id)
            .ok_or_else(|| error::SystemError::not_found("Video not found"))?;
        *stored = VideoEntity { updated_at: chrono::Utc::now(), ..video.clone() };
        Ok(stored.clone())
    }

    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError> {
        Ok(self.videos.lock().unwrap().remove(id).is_some())
    }
}

#[derive(Debug, Clone)]
pub struct StoredObject {
    pub bucket: String,
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
}

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<Vec<StoredObject>>,
    fail_puts: AtomicBool,
}

impl MemoryStorage {
    pub fn objects(&self) -> Vec<StoredObject> {
        self.objects.lock().unwrap().clone()
    }

    pub fn fail_puts(&self) {
        self.fail_puts.store(true, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ObjectStorage for MemoryStorage {
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: &Path,
        content_type: &str,
    ) -> Result<(), error::SystemError> {
        if self.fail_puts.load(Ordering::SeqCst) {
            return Err(error::SystemError::storage("S3 upload failed: service unavailable"));
        }
        let body = tokio::fs::read(body).await?;
        self.objects.lock().unwrap().push(StoredObject {
            bucket: bucket.to_string(),
            key: key.to_string(),
            body,
            content_type: content_type.to_string(),
        });
        Ok(())
    }

    async fn presign_get(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String, error::SystemError> {
        Ok(format!(
            "https://{bucket}.s3.amazonaws.test/{key}?X-Amz-Expires={}",
            expires_in.as_secs()
        ))
    }
}

/// Reports a fixed aspect ratio; fast start copies the input. Every path it
/// is handed or creates is remembered so tests can check cleanup.
pub struct FakeMediaProcessor {
    aspect: Mutex<AspectRatio>,
    fast_start_calls: AtomicUsize,
    fail_probe: AtomicBool,
    fail_fast_start: AtomicBool,
    paths: Mutex<Vec<PathBuf>>,
}

impl Default for FakeMediaProcessor {
    fn default() -> Self {
        Self {
            aspect: Mutex::new(AspectRatio::Landscape),
            fast_start_calls: AtomicUsize::new(0),
            fail_probe: AtomicBool::new(false),
            fail_fast_start: AtomicBool::new(false),
            paths: Mutex::new(Vec::new()),
        }
    }
}

impl FakeMediaProcessor {
    pub fn set_aspect(&self, aspect: AspectRatio) {
        *self.aspect.lock().unwrap() = aspect;
    }

    pub fn fast_start_calls(&self) -> usize {
        self.fast_start_calls.load(Ordering::SeqCst)
    }

    pub fn fail_probe(&self) {
        self.fail_probe.store(true, Ordering::SeqCst);
    }

    pub fn fail_fast_start(&self) {
        self.fail_fast_start.store(true, Ordering::SeqCst);
    }

    /// Uploaded temp files and remuxed outputs seen so far.
    pub fn paths(&self) -> Vec<PathBuf> {
        self.paths.lock().unwrap().clone()
    }

    fn remember(&self, path: &Path) {
        self.paths.lock().unwrap().push(path.to_path_buf());
    }
}

#[async_trait::async_trait]
impl MediaProcessor for FakeMediaProcessor {
    async fn aspect_ratio(&self, input: &Path) -> Result<AspectRatio, error::SystemError> {
        self.remember(input);
        tokio::fs::metadata(input).await?;
        if self.fail_probe.load(Ordering::SeqCst) {
            return Err(error::SystemError::process("ffprobe exited with status 1"));
        }
        Ok(*self.aspect.lock().unwrap())
    }

    async fn fast_start(&self, input: &Path) -> Result<TempPath, error::SystemError> {
        self.fast_start_calls.fetch_add(1, Ordering::SeqCst);
        let mut out = input.to_path_buf();
        out.as_mut_os_string().push(".processing");
        self.remember(&out);
        let out = TempPath::try_from_path(out)?;
        tokio::fs::copy(input, &*out).await?;
        // A failed remux still leaves its partial output behind.
        if self.fail_fast_start.load(Ordering::SeqCst) {
            return Err(error::SystemError::process("ffmpeg exited with status 1"));
        }
        Ok(out)
    }
}

pub type TestService =
    (VideoService, Arc<MemoryVideoRepository>, Arc<MemoryStorage>, Arc<FakeMediaProcessor>);

pub fn test_service_with_assets(config: VideoConfig, assets: AssetStore) -> TestService {
    let repo = Arc::new(MemoryVideoRepository::default());
    let storage = Arc::new(MemoryStorage::default());
    let media = Arc::new(FakeMediaProcessor::default());
    let service = VideoService::with_dependencies(
        repo.clone(),
        storage.clone(),
        media.clone(),
        assets,
        config,
    );
    (service, repo, storage, media)
}

/// Like [`test_service_with_assets`], with assets under a scratch directory
/// that lives as long as the returned guard.
pub fn test_service(
    config: VideoConfig,
) -> (VideoService, Arc<MemoryVideoRepository>, Arc<MemoryStorage>, Arc<FakeMediaProcessor>, TempDir)
{
    let dir = tempfile::tempdir().unwrap();
    let assets = AssetStore::new(dir.path().join("assets"), "http://localhost:8091");
    let (service, repo, storage, media) = test_service_with_assets(config, assets);
    (service, repo, storage, media, dir)
}

pub fn video_owned_by(user_id: Uuid) -> VideoEntity {
    let now = chrono::Utc::now();
    VideoEntity {
        id: Uuid::new_v4(),
        user_id,
        title: "Boots on the ground".to_string(),
        description: "A walk through the dungeon".to_string(),
        thumbnail_url: None,
        video_url: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn bearer_for(user_id: Uuid) -> (&'static str, String) {
    let token = Claims::new(&user_id, 3600).encode(TEST_SECRET.as_bytes()).unwrap();
    ("Authorization", format!("Bearer {token}"))
}

/// `multipart/form-data` body holding one file per `(field, filename,
/// content type, data)` part, and its content type header.
pub fn multipart_form(parts: &[(&str, &str, &str, &[u8])]) -> ((&'static str, String), Vec<u8>) {
    let mut body = Vec::new();
    for (field, filename, content_type, data) in parts {
        body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}\r\n").as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{field}\"; filename=\"{filename}\"\r\n\
                 Content-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(data);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{MULTIPART_BOUNDARY}--\r\n").as_bytes());

    let header = ("Content-Type", format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"));
    (header, body)
}

pub fn multipart_file(
    field: &str,
    filename: &str,
    content_type: &str,
    data: &[u8],
) -> ((&'static str, String), Vec<u8>) {
    multipart_form(&[(field, filename, content_type, data)])
}

pub fn test_app(
    service: VideoService,
    assets: AssetStore,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    App::new()
        .app_data(web::Data::new(AuthConfig::new(TEST_SECRET)))
        .app_data(web::Data::new(service))
        .app_data(web::Data::new(assets))
        .configure(crate::modules::assets::route::configure)
        .service(web::scope("/api").configure(crate::modules::video::route::configure))
}
