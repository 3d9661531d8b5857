//! Completion HTTP handler.
//!
//! `POST /api/completion` accepts three request shapes:
//!
//! - JSON `{messages}`: pre-assembled messages, forwarded after validation
//! - JSON `{content?, imageUrl?}` (`prompt` is accepted for `content`)
//! - `multipart/form-data` with text field `content` and optional file field
//!   `photo`; the photo is stored first and referenced by its public URL
//!
//! The last two go through [`PromptAssembler`].

use axum::{
    extract::{FromRequest, Multipart, Request, State},
    http::header,
    Json,
};
use daybook_core::defaults::PHOTO_FIELD;
use daybook_core::Message;
use daybook_inference::PromptAssembler;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Instant;
use tracing::{debug, info};

use super::uploads::{multipart_error, read_file_field};
use crate::{ApiError, AppState};

/// Pre-assembled message list.
#[derive(Debug, Deserialize)]
pub struct AssembledRequest {
    pub messages: Vec<Message>,
}

/// Raw fields the server assembles itself.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCompletionRequest {
    #[serde(default, alias = "prompt")]
    pub content: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

/// The two entry points into prompt assembly.
#[derive(Debug)]
pub enum CompletionInput {
    Assembled(Vec<Message>),
    Raw(RawCompletionRequest),
}

impl CompletionInput {
    /// Pick the request shape from a JSON body.
    pub fn from_json(body: Value) -> Result<Self, ApiError> {
        if !body.is_object() {
            return Err(ApiError::BadRequest(
                "Request body must be a JSON object".to_string(),
            ));
        }

        if body.get("messages").is_some() {
            let req: AssembledRequest = serde_json::from_value(body)
                .map_err(|e| ApiError::BadRequest(format!("Invalid messages: {}", e)))?;
            Ok(CompletionInput::Assembled(req.messages))
        } else {
            let req: RawCompletionRequest = serde_json::from_value(body)
                .map_err(|e| ApiError::BadRequest(format!("Invalid request: {}", e)))?;
            Ok(CompletionInput::Raw(req))
        }
    }

    pub fn into_messages(self) -> Result<Vec<Message>, ApiError> {
        match self {
            CompletionInput::Assembled(messages) => Ok(messages),
            CompletionInput::Raw(req) => Ok(PromptAssembler::assemble(
                req.content.as_deref(),
                req.image_url.as_deref(),
            )?),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompletionResponse {
    pub result: String,
}

/// Generate a report.
///
/// # Returns
/// - 200 OK with `{result}`
/// - 400 Bad Request for malformed input
/// - the upstream status for completion API errors, with its body in `details`
/// - 500 for transport failures or an unresolved endpoint when a photo is sent
pub async fn create_completion(
    State(state): State<AppState>,
    request: Request,
) -> Result<Json<CompletionResponse>, ApiError> {
    let start = Instant::now();

    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    let input = if is_multipart {
        let multipart = Multipart::from_request(request, &state).await?;
        raw_from_multipart(&state, multipart).await?
    } else {
        let Json(body) = Json::<Value>::from_request(request, &state).await?;
        CompletionInput::from_json(body)?
    };

    let messages = input.into_messages()?;
    let completion = state.backend.complete(&messages).await?;

    info!(
        subsystem = "api",
        op = "completion",
        model = %completion.model,
        multipart = is_multipart,
        duration_ms = start.elapsed().as_millis() as u64,
        "Completion served"
    );

    Ok(Json(CompletionResponse {
        result: completion.text,
    }))
}

async fn raw_from_multipart(
    state: &AppState,
    mut multipart: Multipart,
) -> Result<CompletionInput, ApiError> {
    let mut content = None;
    let mut image_url = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error(e, state.store.max_bytes()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("content") | Some("prompt") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| multipart_error(e, state.store.max_bytes()))?;
                content = Some(text);
            }
            Some(PHOTO_FIELD) => {
                let part = read_file_field(field, state.store.max_bytes()).await?;
                // Browsers send an empty part when no file was picked
                if part.data.is_empty() {
                    continue;
                }
                let endpoint = state.endpoint.require()?;
                let asset = state.store.store(&part.file_name, Some(&part.data)).await?;
                image_url = Some(endpoint.url_for(&state.store.locator_for(&asset)));
            }
            other => debug!(field = ?other, "Ignoring multipart field"),
        }
    }

    Ok(CompletionInput::Raw(RawCompletionRequest { content, image_url }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_messages_shape_selected() {
        let input = CompletionInput::from_json(json!({
            "messages": [{"role": "user", "content": [{"type": "text", "text": "hi"}]}]
        }))
        .unwrap();
        match input {
            CompletionInput::Assembled(messages) => assert_eq!(messages.len(), 1),
            other => panic!("Expected Assembled, got {:?}", other),
        }
    }

    #[test]
    fn test_raw_shape_with_prompt_alias() {
        let input = CompletionInput::from_json(json!({"prompt": "walked the dog"})).unwrap();
        match input {
            CompletionInput::Raw(req) => assert_eq!(req.content.as_deref(), Some("walked the dog")),
            other => panic!("Expected Raw, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_object_assembles_default_prompt() {
        let messages = CompletionInput::from_json(json!({}))
            .unwrap()
            .into_messages()
            .unwrap();
        assert_eq!(messages, PromptAssembler::assemble(None, None).unwrap());
    }

    #[test]
    fn test_non_object_rejected() {
        assert!(CompletionInput::from_json(json!(["hi"])).is_err());
        assert!(CompletionInput::from_json(json!("hi")).is_err());
    }

    #[test]
    fn test_malformed_messages_rejected() {
        assert!(CompletionInput::from_json(json!({"messages": "hi"})).is_err());
        assert!(CompletionInput::from_json(json!({"content": 42})).is_err());
    }
}
