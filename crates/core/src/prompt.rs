//! Prompt construction seam.
//!
//! The engine only needs `post + business context + objective -> text`.
//! [`TemplatePromptBuilder`] is a plain field-joining implementation good
//! enough for local use; richer builders plug in through [`PromptBuilder`].

use crate::post::Post;

/// Prompts longer than this are cut at a character boundary.
pub const MAX_PROMPT_LENGTH: usize = 2_000;

/// Post fields tried, in order, for the post's text body.
const POST_TEXT_FIELDS: &[&str] = &["content", "caption", "text", "title"];

/// Builds the generation prompt for one post.
pub trait PromptBuilder: Send + Sync {
    fn build_prompt(
        &self,
        post: &Post,
        business_context: &serde_json::Value,
        objective: &str,
    ) -> String;
}

/// Joins the interesting post and business fields into one sentence list.
#[derive(Debug, Clone, Default)]
pub struct TemplatePromptBuilder;

impl PromptBuilder for TemplatePromptBuilder {
    fn build_prompt(
        &self,
        post: &Post,
        business_context: &serde_json::Value,
        objective: &str,
    ) -> String {
        let mut parts: Vec<String> = Vec::new();

        let business = context_str(business_context, "business_name")
            .or_else(|| context_str(business_context, "name"));
        match (business, context_str(business_context, "industry")) {
            (Some(name), Some(industry)) => {
                parts.push(format!("Social media visual for {name}, a {industry} business"))
            }
            (Some(name), None) => parts.push(format!("Social media visual for {name}")),
            (None, Some(industry)) => {
                parts.push(format!("Social media visual for a {industry} business"))
            }
            (None, None) => parts.push("Social media visual".to_string()),
        }

        if let Some(platform) = post.field_str("platform") {
            parts.push(format!("Platform: {platform}"));
        }
        if let Some(text) = POST_TEXT_FIELDS.iter().find_map(|f| post.field_str(f)) {
            parts.push(format!("Post: {}", text.trim()));
        }
        if !objective.trim().is_empty() {
            parts.push(format!("Campaign objective: {}", objective.trim()));
        }
        if let Some(audience) = context_str(business_context, "target_audience") {
            parts.push(format!("Audience: {audience}"));
        }
        if let Some(voice) = context_str(business_context, "brand_voice") {
            parts.push(format!("Style: {voice}"));
        }

        truncate_prompt(parts.join(". "))
    }
}

fn context_str<'a>(context: &'a serde_json::Value, key: &str) -> Option<&'a str> {
    context
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Cut `prompt` to at most [`MAX_PROMPT_LENGTH`] bytes without splitting a
/// character.
pub fn truncate_prompt(mut prompt: String) -> String {
    if prompt.len() > MAX_PROMPT_LENGTH {
        let mut end = MAX_PROMPT_LENGTH;
        while !prompt.is_char_boundary(end) {
            end -= 1;
        }
        prompt.truncate(end);
    }
    prompt
}
