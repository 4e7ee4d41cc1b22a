//! Caption and keyword generation via the OpenAI chat API.

use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestMessage, ChatCompletionRequestMessageContentPartImageArgs,
    ChatCompletionRequestMessageContentPartTextArgs, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestUserMessageArgs, ChatCompletionRequestUserMessageContent,
    ChatCompletionRequestUserMessageContentPart, CreateChatCompletionRequestArgs, ImageUrlArgs,
};
use async_openai::Client;
use serde::Deserialize;
use tracing::info;

use crate::error::{CaptionError, Result};

const MODEL: &str = "gpt-4o-mini";
const REQUEST_TIMEOUT_SECS: u64 = 300;

const SYSTEM_PROMPT: &str = "You are a professional stock photo caption and keyword generator, \
highly skilled in analyzing images and producing detailed captions and relevant keywords for a \
stock photo website. Given a grid of frames extracted from a video, your task is to: \
1. Provide a caption or title within 20 words that accurately summarizes the key content and \
visual theme of the video, based on the images in the grid. The caption should be relevant and \
professional, suitable for a stock photo website. \
2. Generate a list of keywords that describe the main themes, objects, actions, people, and \
environments depicted in the frames. The keywords should be specific, relevant, and optimized \
for searchability on a stock photo platform. Generate not less than 20 keywords, up to 50. \
Stock photo sites focus on the mood, color palette, and visual tone of the content, on specific \
objects, actions, or scenes, and on descriptive terms customers might search for. \
Respond with a single JSON object with exactly two keys: \"caption\" (a string) and \
\"keywords\" (an array of strings). Output raw JSON only, with no surrounding text or markdown.";

const USER_PROMPT: &str =
    "Provide the caption and keywords for the following image that is extracted from a video.";

/// Parsed model output.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct CaptionResult {
    pub caption: String,
    pub keywords: Vec<String>,
}

/// Send a base64-encoded JPEG grid to the model and parse its reply.
pub(crate) async fn caption_grid(
    encoded_grid: &str,
    api_key: Option<&str>,
) -> Result<CaptionResult> {
    let request = CreateChatCompletionRequestArgs::default()
        .model(MODEL)
        .max_tokens(4000_u32)
        .temperature(0.8)
        .messages([
            ChatCompletionRequestMessage::System(
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(SYSTEM_PROMPT)
                    .build()?,
            ),
            ChatCompletionRequestMessage::User(
                ChatCompletionRequestUserMessageArgs::default()
                    .content(ChatCompletionRequestUserMessageContent::Array(vec![
                        ChatCompletionRequestUserMessageContentPart::Text(
                            ChatCompletionRequestMessageContentPartTextArgs::default()
                                .text(USER_PROMPT)
                                .build()?,
                        ),
                        ChatCompletionRequestUserMessageContentPart::ImageUrl(
                            ChatCompletionRequestMessageContentPartImageArgs::default()
                                .image_url(
                                    ImageUrlArgs::default()
                                        .url(format!("data:image/jpeg;base64,{encoded_grid}"))
                                        .build()?,
                                )
                                .build()?,
                        ),
                    ]))
                    .build()?,
            ),
        ])
        .build()?;

    let client = match api_key {
        Some(key) => Client::with_config(OpenAIConfig::new().with_api_key(key)),
        None => Client::new(),
    };

    info!(model = MODEL, "requesting caption and keywords");
    let response = tokio::time::timeout(
        tokio::time::Duration::from_secs(REQUEST_TIMEOUT_SECS),
        client.chat().create(request),
    )
    .await
    .map_err(|_| CaptionError::ModelTimeout)??;

    let text = response
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .ok_or_else(|| CaptionError::MalformedModelResponse {
            text: "<empty response>".into(),
        })?;

    parse_response(&text)
}

/// Strictly parse the model's reply. There is no repair pass: anything that
/// is not the expected JSON object fails the run.
pub(crate) fn parse_response(text: &str) -> Result<CaptionResult> {
    serde_json::from_str(text).map_err(|_| CaptionError::MalformedModelResponse {
        text: text.to_owned(),
    })
}
