//! [`Provider`] implementation backed by a ComfyUI server.
//!
//! Each content type maps to a workflow template (API-format JSON). String
//! values in the template may contain `{{prompt}}` and `{{job_id}}`
//! placeholders, which are substituted before the workflow is queued.
//! Completion is detected by polling `/history/{prompt_id}`.

use std::time::Duration;

use async_trait::async_trait;
use vizgen_core::content::ContentType;

use crate::api::{ComfyUIApi, ComfyUIApiError};
use crate::provider::{GenerationError, GenerationOutcome, GenerationRequest, Provider};

/// Placeholder replaced by the job prompt.
pub const PROMPT_PLACEHOLDER: &str = "{{prompt}}";

/// Placeholder replaced by the job id (useful as a filename prefix).
pub const JOB_ID_PLACEHOLDER: &str = "{{job_id}}";

/// Default delay between history polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);

/// Consecutive failed history polls tolerated before giving up.
const MAX_CONSECUTIVE_POLL_ERRORS: u32 = 5;

/// Output keys searched for files, per content type, in preference order.
const IMAGE_OUTPUT_KEYS: &[&str] = &["images"];
const VIDEO_OUTPUT_KEYS: &[&str] = &["videos", "gifs", "images"];

/// Workflow templates per content type.
#[derive(Debug, Clone, Default)]
pub struct WorkflowTemplates {
    pub image: Option<serde_json::Value>,
    pub video: Option<serde_json::Value>,
}

impl WorkflowTemplates {
    fn for_content_type(&self, content_type: ContentType) -> Option<&serde_json::Value> {
        match content_type {
            ContentType::Image => self.image.as_ref(),
            ContentType::Video => self.video.as_ref(),
        }
    }
}

/// Generates assets by queuing workflows on one ComfyUI instance.
pub struct ComfyUIProvider {
    api: ComfyUIApi,
    templates: WorkflowTemplates,
    poll_interval: Duration,
}

impl ComfyUIProvider {
    pub fn new(api: ComfyUIApi, templates: WorkflowTemplates) -> Self {
        Self {
            api,
            templates,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Poll the history endpoint until the prompt settles.
    async fn wait_for_output(
        &self,
        prompt_id: &str,
        content_type: ContentType,
    ) -> Result<OutputFile, GenerationError> {
        let mut consecutive_errors = 0u32;

        loop {
            tokio::time::sleep(self.poll_interval).await;

            let history = match self.api.get_history(prompt_id).await {
                Ok(history) => {
                    consecutive_errors = 0;
                    history
                }
                Err(e) => {
                    consecutive_errors += 1;
                    tracing::warn!(
                        prompt_id,
                        attempt = consecutive_errors,
                        error = %e,
                        "Failed to fetch ComfyUI history",
                    );
                    if consecutive_errors >= MAX_CONSECUTIVE_POLL_ERRORS {
                        return Err(api_error(e));
                    }
                    continue;
                }
            };

            match parse_history(prompt_id, &history, content_type) {
                HistoryState::Pending => continue,
                HistoryState::Failed(message) => return Err(GenerationError::Rejected(message)),
                HistoryState::NoOutput => return Err(GenerationError::EmptyResult),
                HistoryState::Done(file) => return Ok(file),
            }
        }
    }
}

#[async_trait]
impl Provider for ComfyUIProvider {
    fn name(&self) -> &str {
        "comfyui"
    }

    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GenerationOutcome, GenerationError> {
        let template = self
            .templates
            .for_content_type(request.content_type)
            .ok_or(GenerationError::Unsupported(request.content_type))?;
        let workflow = render_workflow(template, &request.prompt, &request.job_id);

        let client_id = uuid::Uuid::new_v4().to_string();
        let submitted = self
            .api
            .submit_workflow(&workflow, &client_id)
            .await
            .map_err(api_error)?;

        tracing::info!(
            job_id = %request.job_id,
            prompt_id = %submitted.prompt_id,
            queue_position = submitted.number,
            "Workflow submitted to ComfyUI",
        );

        let file = self
            .wait_for_output(&submitted.prompt_id, request.content_type)
            .await?;
        let result_url = self
            .api
            .view_url(&file.filename, &file.subfolder, &file.file_type)
            .map_err(api_error)?;

        Ok(GenerationOutcome {
            result_url,
            provider_ref: Some(submitted.prompt_id),
        })
    }
}

fn api_error(e: ComfyUIApiError) -> GenerationError {
    match e {
        ComfyUIApiError::ApiError { status, body } => GenerationError::Api { status, body },
        other => GenerationError::Request(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Workflow rendering
// ---------------------------------------------------------------------------

/// Copy `template`, substituting placeholders in every string value.
pub fn render_workflow(
    template: &serde_json::Value,
    prompt: &str,
    job_id: &str,
) -> serde_json::Value {
    use serde_json::Value;

    match template {
        Value::String(s) => Value::String(
            s.replace(PROMPT_PLACEHOLDER, prompt)
                .replace(JOB_ID_PLACEHOLDER, job_id),
        ),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| render_workflow(v, prompt, job_id))
                .collect(),
        ),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), render_workflow(v, prompt, job_id)))
                .collect(),
        ),
        other => other.clone(),
    }
}

// ---------------------------------------------------------------------------
// History parsing
// ---------------------------------------------------------------------------

/// A file produced by a workflow output node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputFile {
    pub filename: String,
    pub subfolder: String,
    pub file_type: String,
}

/// Interpretation of a `/history/{prompt_id}` response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryState {
    /// Not finished yet (history is empty for queued/running prompts).
    Pending,
    /// Execution ended with an error message.
    Failed(String),
    /// Execution succeeded but produced no file of a usable kind.
    NoOutput,
    /// Execution succeeded; the first usable output file.
    Done(OutputFile),
}

/// Decide where a prompt stands from its history entry.
pub fn parse_history(
    prompt_id: &str,
    history: &serde_json::Value,
    content_type: ContentType,
) -> HistoryState {
    let Some(entry) = history.get(prompt_id) else {
        return HistoryState::Pending;
    };

    let status = entry.get("status");
    let status_str = status
        .and_then(|s| s.get("status_str"))
        .and_then(|s| s.as_str());
    if status_str == Some("error") {
        return HistoryState::Failed(execution_error_message(status));
    }
    let completed = status
        .and_then(|s| s.get("completed"))
        .and_then(|c| c.as_bool())
        .unwrap_or(true);
    if !completed {
        return HistoryState::Pending;
    }

    let keys = match content_type {
        ContentType::Image => IMAGE_OUTPUT_KEYS,
        ContentType::Video => VIDEO_OUTPUT_KEYS,
    };
    let Some(outputs) = entry.get("outputs").and_then(|o| o.as_object()) else {
        return HistoryState::NoOutput;
    };

    for key in keys {
        for node_output in outputs.values() {
            let files = node_output.get(*key).and_then(|f| f.as_array());
            for file in files.into_iter().flatten() {
                if let Some(parsed) = parse_output_file(file) {
                    return HistoryState::Done(parsed);
                }
            }
        }
    }
    HistoryState::NoOutput
}

fn parse_output_file(file: &serde_json::Value) -> Option<OutputFile> {
    let filename = file.get("filename")?.as_str()?;
    if filename.is_empty() {
        return None;
    }
    let field = |name: &str, default: &str| {
        file.get(name)
            .and_then(|v| v.as_str())
            .unwrap_or(default)
            .to_string()
    };
    Some(OutputFile {
        filename: filename.to_string(),
        subfolder: field("subfolder", ""),
        file_type: field("type", "output"),
    })
}

/// Pull the exception message out of an `execution_error` status message.
fn execution_error_message(status: Option<&serde_json::Value>) -> String {
    status
        .and_then(|s| s.get("messages"))
        .and_then(|m| m.as_array())
        .into_iter()
        .flatten()
        .filter_map(|msg| msg.as_array())
        .filter(|pair| pair.first().and_then(|t| t.as_str()) == Some("execution_error"))
        .find_map(|pair| {
            pair.get(1)?
                .get("exception_message")?
                .as_str()
                .map(|s| s.trim().to_string())
        })
        .unwrap_or_else(|| "ComfyUI reported an execution error".to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
