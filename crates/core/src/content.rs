//! Content-type expansion and duration estimate policy.
//!
//! Maps a post's declared type to the visual assets it needs, and each
//! asset kind to an average generation time used for ETA reporting.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Post type that needs a single still image.
pub const POST_TYPE_TEXT_IMAGE: &str = "text_image";

/// Post type that needs a still image plus a short video.
pub const POST_TYPE_TEXT_VIDEO: &str = "text_video";

/// Default average generation time for an image, in seconds.
pub const DEFAULT_IMAGE_ESTIMATE_SECS: u32 = 45;

/// Default average generation time for a video, in seconds.
pub const DEFAULT_VIDEO_ESTIMATE_SECS: u32 = 120;

const IMAGE_ONLY: &[ContentType] = &[ContentType::Image];
const IMAGE_AND_VIDEO: &[ContentType] = &[ContentType::Image, ContentType::Video];

// ---------------------------------------------------------------------------
// ContentType
// ---------------------------------------------------------------------------

/// The kind of asset a job produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Image,
    Video,
}

impl ContentType {
    /// Lowercase name, used as the job id prefix and in URLs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Expansion policy
// ---------------------------------------------------------------------------

/// Content types a post of the given type requires, in generation order.
///
/// Unknown types (plain text, polls, ...) need no visual and return an
/// empty slice.
pub fn required_content_types(post_type: &str) -> &'static [ContentType] {
    match post_type {
        POST_TYPE_TEXT_IMAGE => IMAGE_ONLY,
        POST_TYPE_TEXT_VIDEO => IMAGE_AND_VIDEO,
        _ => &[],
    }
}

// ---------------------------------------------------------------------------
// Estimate policy
// ---------------------------------------------------------------------------

/// Average generation duration per content type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EstimatePolicy {
    pub image_secs: u32,
    pub video_secs: u32,
}

impl EstimatePolicy {
    /// Estimated seconds to generate one asset of `content_type`.
    pub fn estimate_secs(&self, content_type: ContentType) -> u32 {
        match content_type {
            ContentType::Image => self.image_secs,
            ContentType::Video => self.video_secs,
        }
    }
}

impl Default for EstimatePolicy {
    fn default() -> Self {
        Self {
            image_secs: DEFAULT_IMAGE_ESTIMATE_SECS,
            video_secs: DEFAULT_VIDEO_ESTIMATE_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
