//! OpenAI chat completions wire types.

use daybook_core::Message;
use serde::{Deserialize, Serialize};

// =============================================================================
// REQUEST
// =============================================================================

/// Request body for the chat completions endpoint.
///
/// Messages serialize in the multimodal part format, so text and image
/// references travel in one `content` array per message.
#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: f32,
    pub frequency_penalty: f32,
    pub presence_penalty: f32,
}

// =============================================================================
// RESPONSE
// =============================================================================

/// Response from the chat completions endpoint.
///
/// Every field is optional so a structurally odd 2xx body is reported as a
/// contract violation instead of a parse failure deep inside serde.
#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub choices: Vec<ChatChoice>,
}

/// Single chat completion choice.
#[derive(Debug, Deserialize)]
pub struct ChatChoice {
    #[serde(default)]
    pub message: Option<ChatResponseMessage>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

/// Assistant message inside a choice.
#[derive(Debug, Deserialize)]
pub struct ChatResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Text of `choices[0].message.content`, if present.
    pub fn first_content(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|c| c.message.as_ref())
            .and_then(|m| m.content.as_deref())
    }

    pub fn first_finish_reason(&self) -> Option<String> {
        self.choices.first().and_then(|c| c.finish_reason.clone())
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Error response from OpenAI API. Only used to classify failures for logs;
/// the raw body is what reaches the caller.
#[derive(Debug, Deserialize)]
pub struct OpenAIErrorResponse {
    pub error: OpenAIError,
}

/// Detailed error information.
#[derive(Debug, Deserialize)]
pub struct OpenAIError {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use daybook_core::ContentPart;

    #[test]
    fn test_chat_completion_request_serialization() {
        let request = ChatCompletionRequest {
            model: "gpt-4o-mini",
            messages: vec![
                Message::system("You are helpful."),
                Message::user(vec![
                    ContentPart::text("Hello"),
                    ContentPart::image("https://x.test/a.png"),
                ]),
            ],
            max_tokens: 150,
            temperature: 0.7,
            frequency_penalty: 0.2,
            presence_penalty: 0.6,
        };

        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "gpt-4o-mini");
        assert_eq!(json["max_tokens"], 150);
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"][1]["image_url"]["url"], "https://x.test/a.png");
        assert!(json.get("stream").is_none());
    }

    #[test]
    fn test_chat_completion_response_deserialization() {
        let json = r#"{
            "id": "chatcmpl-123",
            "model": "gpt-4o-mini-2024-07-18",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "Hello!"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
        }"#;

        let response: ChatCompletionResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.first_content(), Some("Hello!"));
        assert_eq!(response.first_finish_reason(), Some("stop".to_string()));
        assert_eq!(response.model.as_deref(), Some("gpt-4o-mini-2024-07-18"));
    }

    #[test]
    fn test_response_without_choices_has_no_content() {
        let response: ChatCompletionResponse = serde_json::from_str(r#"{"id":"x"}"#).unwrap();
        assert!(response.first_content().is_none());

        let response: ChatCompletionResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(response.first_content().is_none());
    }

    #[test]
    fn test_openai_error_response_deserialization() {
        let json = r#"{"error":{"message":"Rate limit reached","type":"requests","code":"rate_limit_exceeded"}}"#;
        let response: OpenAIErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.error.error_type.as_deref(), Some("requests"));
        assert_eq!(response.error.code.as_deref(), Some("rate_limit_exceeded"));
    }
}
