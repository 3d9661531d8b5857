//! Prompt assembly.
//!
//! Turns an optional note and an optional absolute image URL into the message
//! sequence sent to the completion API:
//!
//! | note | image | message parts |
//! |------|-------|---------------|
//! | no   | no    | `Text(PROMPT_DEFAULT)` |
//! | yes  | no    | `Text(PROMPT_NOTE_ONLY + note)` |
//! | no   | yes   | `Text(PROMPT_IMAGE_ONLY)`, `ImageRef(url)` |
//! | yes  | yes   | `Text(PROMPT_NOTE_AND_IMAGE + note)`, `ImageRef(url)` |
//!
//! Notes are trimmed but otherwise passed through untouched.

use daybook_core::defaults::{
    PROMPT_DEFAULT, PROMPT_IMAGE_ONLY, PROMPT_NOTE_AND_IMAGE, PROMPT_NOTE_ONLY,
};
use daybook_core::{ContentPart, Error, Message, Result, Role};
use reqwest::Url;
use tracing::debug;

/// Builds report prompts from raw request fields.
pub struct PromptAssembler;

impl PromptAssembler {
    /// Assemble the message sequence for an optional note and image URL.
    ///
    /// Whitespace-only values count as absent. `image_url` must be absolute
    /// (`http`/`https`); a relative locator is rejected with `InvalidRequest`.
    pub fn assemble(text: Option<&str>, image_url: Option<&str>) -> Result<Vec<Message>> {
        let note = text.map(str::trim).filter(|t| !t.is_empty());
        let image = image_url.map(str::trim).filter(|u| !u.is_empty());

        if let Some(url) = image {
            ensure_absolute(url)?;
        }

        let parts = match (note, image) {
            (None, None) => vec![ContentPart::text(PROMPT_DEFAULT)],
            (Some(note), None) => vec![ContentPart::text(format!("{}{}", PROMPT_NOTE_ONLY, note))],
            (None, Some(url)) => vec![ContentPart::text(PROMPT_IMAGE_ONLY), ContentPart::image(url)],
            (Some(note), Some(url)) => vec![
                ContentPart::text(format!("{}{}", PROMPT_NOTE_AND_IMAGE, note)),
                ContentPart::image(url),
            ],
        };

        debug!(
            subsystem = "inference",
            op = "assemble",
            has_note = note.is_some(),
            has_image = image.is_some(),
            "Assembled report prompt"
        );

        Ok(vec![Message::user(parts)])
    }
}

/// Check a pre-assembled message sequence before it goes upstream.
///
/// Rejects an empty sequence, messages not authored by the user, messages
/// without parts, empty text parts, and image references that are not
/// absolute `http`/`https` URLs. The system message belongs to the server.
pub fn validate_messages(messages: &[Message]) -> Result<()> {
    if messages.is_empty() {
        return Err(Error::InvalidRequest(
            "messages must be a non-empty sequence".to_string(),
        ));
    }

    for (i, message) in messages.iter().enumerate() {
        if message.role != Role::User {
            return Err(Error::InvalidRequest(format!(
                "message {} has role '{}', only 'user' is accepted",
                i,
                message.role.as_str()
            )));
        }
        if message.parts.is_empty() {
            return Err(Error::InvalidRequest(format!("message {} has no content", i)));
        }
        for part in &message.parts {
            match part {
                ContentPart::Text { text } if text.trim().is_empty() => {
                    return Err(Error::InvalidRequest(format!(
                        "message {} has an empty text part",
                        i
                    )));
                }
                ContentPart::ImageRef { image_url } => ensure_absolute(&image_url.url)?,
                ContentPart::Text { .. } => {}
            }
        }
    }

    Ok(())
}

fn ensure_absolute(url: &str) -> Result<()> {
    match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") && parsed.has_host() => Ok(()),
        _ => Err(Error::InvalidRequest(format!(
            "image URL must be an absolute http(s) URL, got '{}'",
            url
        ))),
    }
}
