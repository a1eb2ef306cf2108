pub mod aspect_ratio;
pub mod processor;

pub use aspect_ratio::AspectRatio;
pub use processor::{FfmpegProcessor, MediaProcessor};
