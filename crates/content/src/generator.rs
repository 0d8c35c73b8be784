//! AI content generation: captions, images, and translation.

use std::path::PathBuf;

use {
    async_trait::async_trait,
    base64::Engine,
    gramflow_config::{ImageApiConfig, TextApiConfig},
    secrecy::ExposeSecret,
    tokio::fs,
    tracing::{debug, warn},
};

use crate::{
    backoff::{BackoffPolicy, execute_with_backoff},
    error::{Context, Error, Result},
};

/// Content generator collaborator.
///
/// Text and image generation surface their failures; translation degrades to
/// the original text so a flaky translation service never blocks a post.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    async fn generate_text(&self, prompt: &str) -> Result<String>;
    async fn generate_image(&self, prompt: &str) -> Result<PathBuf>;
    async fn translate(&self, text: &str, target_lang: &str) -> String;
}

/// Generator backed by an OpenAI-style chat API and a Stability-style
/// text-to-image API.
pub struct HttpContentGenerator {
    http: reqwest::Client,
    policy: BackoffPolicy,
    text_api: TextApiConfig,
    image_api: ImageApiConfig,
    /// Where generated images are written.
    output_dir: PathBuf,
}

impl HttpContentGenerator {
    pub fn new(text_api: TextApiConfig, image_api: ImageApiConfig, output_dir: PathBuf) -> Self {
        Self {
            http: reqwest::Client::new(),
            policy: BackoffPolicy::default(),
            text_api,
            image_api,
            output_dir,
        }
    }

    /// Override the backoff policy (tests use a shrunk base delay).
    #[must_use]
    pub fn with_policy(mut self, policy: BackoffPolicy) -> Self {
        self.policy = policy;
        self
    }

    async fn chat_completion(
        &self,
        operation: &'static str,
        prompt: &str,
        temperature: f64,
    ) -> Result<String> {
        let url = format!(
            "{}/v1/chat/completions",
            self.text_api.base_url.trim_end_matches('/')
        );
        let body = serde_json::json!({
            "model": self.text_api.model,
            "messages": [{ "role": "user", "content": prompt }],
            "max_tokens": 200,
            "temperature": temperature,
        });

        let response = execute_with_backoff(&self.policy, operation, || {
            let mut req = self.http.post(&url).json(&body);
            if let Some(key) = &self.text_api.api_key {
                req = req.bearer_auth(key.expose_secret());
            }
            req.send()
        })
        .await?;

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::transport(operation, e))?;
        let text = value["choices"][0]["message"]["content"]
            .as_str()
            .with_context(|| format!("{operation}: response carried no message content"))?;
        Ok(text.trim().to_string())
    }
}

#[async_trait]
impl ContentGenerator for HttpContentGenerator {
    async fn generate_text(&self, prompt: &str) -> Result<String> {
        if prompt.trim().is_empty() {
            return Err(Error::invalid_input("prompt must not be empty"));
        }
        self.chat_completion("generate text", prompt, 0.7).await
    }

    async fn generate_image(&self, prompt: &str) -> Result<PathBuf> {
        if prompt.trim().is_empty() {
            return Err(Error::invalid_input("prompt must not be empty"));
        }

        // The image API works best with English prompts.
        let translated = self.translate(prompt, "en").await;
        debug!(prompt, translated = %translated, "image generation prompt");

        let url = format!(
            "{}/v1/generation/{}/text-to-image",
            self.image_api.base_url.trim_end_matches('/'),
            self.image_api.engine
        );
        let body = serde_json::json!({
            "text_prompts": [{ "text": translated }],
            "cfg_scale": 7,
            "height": 1024,
            "width": 1024,
            "samples": 1,
            "steps": 30,
        });

        let response = execute_with_backoff(&self.policy, "generate image", || {
            let mut req = self.http.post(&url).json(&body);
            if let Some(key) = &self.image_api.api_key {
                req = req.bearer_auth(key.expose_secret());
            }
            req.send()
        })
        .await?;

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::transport("generate image", e))?;
        let artifact = value["artifacts"][0]["base64"]
            .as_str()
            .context("image API returned no artifacts")?;
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(artifact)
            .context("failed to decode image artifact")?;

        fs::create_dir_all(&self.output_dir).await?;
        let path = self
            .output_dir
            .join(format!("ai_generated_{}.png", uuid::Uuid::new_v4()));
        fs::write(&path, &bytes).await?;
        Ok(path)
    }

    async fn translate(&self, text: &str, target_lang: &str) -> String {
        if text.trim().is_empty() {
            return String::new();
        }

        let prompt = format!(
            "Translate the following text to {target_lang}. \
             Reply with only the translation.\n\n{text}"
        );
        match self.chat_completion("translate", &prompt, 0.0).await {
            Ok(translated) if !translated.is_empty() => translated,
            Ok(_) => text.to_string(),
            Err(e) => {
                warn!(error = %e, "translation failed, using original text");
                text.to_string()
            },
        }
    }
}
