pub mod assets;
pub mod media;
pub mod storage;
pub mod video;
