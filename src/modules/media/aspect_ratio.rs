use std::fmt;

/// Orientation bucket of a video, also used as its storage key prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AspectRatio {
    /// Roughly 16:9.
    Landscape,
    /// Roughly 9:16.
    Portrait,
    Other,
}

impl AspectRatio {
    pub fn from_dimensions(width: u32, height: u32) -> Self {
        if height == 0 {
            return Self::Other;
        }
        Self::from_ratio(f64::from(width) / f64::from(height))
    }

    pub fn from_ratio(ratio: f64) -> Self {
        if ratio > 1.7 && ratio < 1.9 {
            Self::Landscape
        } else if ratio > 0.5 && ratio < 0.6 {
            Self::Portrait
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Landscape => "landscape",
            Self::Portrait => "portrait",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
