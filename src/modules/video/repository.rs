use uuid::Uuid;

use crate::{
    api::error,
    modules::video::{model::NewVideo, schema::VideoEntity},
};

#[async_trait::async_trait]
pub trait VideoRepository {
    async fn find_by_id(&self, id: &Uuid) -> Result<Option<VideoEntity>, error::SystemError>;

    /// Videos owned by `user_id`, newest first.
    async fn find_by_user(&self, user_id: &Uuid) -> Result<Vec<VideoEntity>, error::SystemError>;

    async fn create(&self, video: &NewVideo) -> Result<VideoEntity, error::SystemError>;

    /// Writes the whole record back and refreshes `updated_at`.
    async fn update(&self, video: &VideoEntity) -> Result<VideoEntity, error::SystemError>;

    async fn delete(&self, id: &Uuid) -> Result<bool, error::SystemError>;
}
