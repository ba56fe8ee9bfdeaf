//! Incoming post payloads and submission-time validation.

use serde::{de, Deserialize, Deserializer, Serialize};
use validator::Validate;

use crate::error::CoreError;

/// A social-media post that may need visual assets.
///
/// Only `id` and `type` are interpreted by the engine. Every other field
/// (caption, hashtags, platform, ...) is carried verbatim in `extra` and
/// handed to the prompt builder and provider as part of the job metadata.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Post {
    /// Upstream stores hand out both string and integer ids; numbers are
    /// kept in their decimal form.
    #[serde(default, deserialize_with = "string_or_number")]
    #[validate(length(min = 1, message = "post id must not be empty"))]
    pub id: String,

    #[serde(rename = "type", default)]
    #[validate(length(min = 1, message = "post type must not be empty"))]
    pub post_type: String,

    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl Post {
    pub fn new(id: impl Into<String>, post_type: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            post_type: post_type.into(),
            extra: serde_json::Map::new(),
        }
    }

    /// Attach an extra field (caption, platform, ...).
    pub fn with_field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Look up an extra field as a string.
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(|v| v.as_str())
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!(
            "post id must be a string or a number, got {other}"
        ))),
    }
}

/// Validate a campaign id: non-empty, no whitespace, no path separators.
pub fn validate_campaign_id(campaign_id: &str) -> Result<(), CoreError> {
    if campaign_id.is_empty() {
        return Err(CoreError::Validation(
            "Campaign id must not be empty".to_string(),
        ));
    }
    if campaign_id
        .chars()
        .any(|c| c.is_whitespace() || c == '/' || c == '\\')
    {
        return Err(CoreError::Validation(format!(
            "Campaign id \"{campaign_id}\" may not contain whitespace or slashes"
        )));
    }
    Ok(())
}

/// Validate every post in a batch before any job is created.
///
/// The first malformed post aborts the whole batch; the error names its
/// index so callers can locate it.
pub fn validate_posts(posts: &[Post]) -> Result<(), CoreError> {
    for (i, post) in posts.iter().enumerate() {
        if let Err(errors) = post.validate() {
            return Err(CoreError::Validation(format!(
                "Post at index {i} is malformed: {errors}"
            )));
        }
    }
    Ok(())
}
