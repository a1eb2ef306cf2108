pub mod assets;
pub mod object_storage;
pub mod s3;

pub use assets::AssetStore;
pub use object_storage::ObjectStorage;
pub use s3::S3Storage;
