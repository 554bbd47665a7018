//! OpenRouter-backed model adapter
//!
//! Sends the patch as an image part of a chat-completion request and
//! extracts the edited image from the response. Failures map onto the
//! pipeline error taxonomy without retrying.

use crate::backends::PatchModel;
use crate::error::{EditError, Result};
use crate::services::data_url;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

const DEFAULT_ENDPOINT: &str = "https://openrouter.ai/api/v1/chat/completions";
const DEFAULT_MODEL: &str = "google/gemini-2.5-flash-image-preview";

/// Model adapter speaking the OpenRouter chat-completions API
#[derive(Debug)]
pub struct OpenRouterModel {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenRouterModel {
    /// Create an adapter with the default endpoint and model
    ///
    /// # Errors
    /// - HTTP client construction failures
    pub fn new<S: Into<String>>(api_key: S) -> Result<Self> {
        let client = Client::builder().build()?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
        })
    }

    /// Override the model slug
    #[must_use]
    pub fn with_model<S: Into<String>>(mut self, model: S) -> Self {
        self.model = model.into();
        self
    }

    /// Override the endpoint URL, for gateways and test servers
    #[must_use]
    pub fn with_endpoint<S: Into<String>>(mut self, endpoint: S) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl PatchModel for OpenRouterModel {
    async fn generate_from_patch(&self, prompt: &str, patch_png: &[u8]) -> Result<Vec<u8>> {
        let body = json!({
            "model": self.model,
            "modalities": ["image", "text"],
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": prompt },
                    {
                        "type": "image_url",
                        "image_url": { "url": data_url::encode_png_data_url(patch_png) }
                    }
                ]
            }]
        });

        debug!(
            "posting {}-byte patch to {} as {}",
            patch_png.len(),
            self.endpoint,
            self.model
        );

        let response = self
            .client
            .post(self.endpoint.as_str())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            warn!("model endpoint returned {}", status);
            return Err(match status.as_u16() {
                401 | 403 => EditError::InvalidCredential,
                429 => EditError::RateLimited,
                code => EditError::ModelHttp(code),
            });
        }

        let parsed: ChatResponse = response.json().await?;
        extract_image(&parsed)
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    #[serde(default)]
    images: Vec<ImagePart>,
}

#[derive(Debug, Deserialize)]
struct ImagePart {
    image_url: ImageUrl,
}

#[derive(Debug, Deserialize)]
struct ImageUrl {
    url: String,
}

/// Pull the first returned image out of a chat response
fn extract_image(response: &ChatResponse) -> Result<Vec<u8>> {
    let url = response
        .choices
        .iter()
        .flat_map(|choice| choice.message.images.iter())
        .map(|part| part.image_url.url.as_str())
        .next()
        .ok_or(EditError::NoImageInResponse)?;

    data_url::decode_image_data_url(url).map_err(|_| EditError::NoImageInResponse)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose, Engine as _};

    #[test]
    fn test_extract_image_from_response() {
        let payload = general_purpose::STANDARD.encode([1u8, 2, 3, 4]);
        let raw = format!(
            r#"{{"choices":[{{"message":{{"images":[{{"image_url":{{"url":"data:image/png;base64,{}"}}}}]}}}}]}}"#,
            payload
        );
        let parsed: ChatResponse = serde_json::from_str(&raw).unwrap();
        assert_eq!(extract_image(&parsed).unwrap(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_missing_image_is_reported() {
        let parsed: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{}}]}"#).unwrap();
        assert!(matches!(
            extract_image(&parsed),
            Err(EditError::NoImageInResponse)
        ));

        let parsed: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(
            extract_image(&parsed),
            Err(EditError::NoImageInResponse)
        ));
    }

    #[test]
    fn test_undecodable_image_is_reported() {
        let raw = r#"{"choices":[{"message":{"images":[{"image_url":{"url":"data:image/png;base64,@@@"}}]}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            extract_image(&parsed),
            Err(EditError::NoImageInResponse)
        ));
    }

    #[test]
    fn test_builder_overrides() {
        let model = OpenRouterModel::new("sk-test")
            .unwrap()
            .with_model("test/model")
            .with_endpoint("http://127.0.0.1:1/v1/chat/completions");
        assert_eq!(model.model, "test/model");
        assert!(model.endpoint.starts_with("http://127.0.0.1"));
    }
}
