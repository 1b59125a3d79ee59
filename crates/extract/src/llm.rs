use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Normalized text-generation capability. Every backend adapter exposes
/// exactly one operation: prompt in, generated text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Serialize)]
struct OllamaOptions {
    temperature: f32,
    top_p: f32,
    num_predict: i32,
}

#[derive(Deserialize)]
struct OllamaResponse {
    response: String,
}

impl OllamaGenerator {
    pub fn new(base_url: String, model: String) -> Self {
        Self {
            base_url,
            model,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: prompt.to_string(),
            stream: false,
            options: OllamaOptions {
                temperature: 0.2,
                top_p: 0.9,
                num_predict: 1536,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Ollama")?;

        if !response.status().is_success() {
            anyhow::bail!("Ollama request failed: {}", response.status());
        }

        let ollama_response: OllamaResponse = response
            .json()
            .await
            .context("Failed to parse Ollama response")?;

        Ok(ollama_response.response)
    }
}

/// Adapter for a llama.cpp HTTP server (`llama-server`).
#[derive(Clone)]
pub struct LlamaServerGenerator {
    base_url: String,
    temperature: f32,
    top_p: f32,
    max_tokens: i32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct CompletionRequest {
    prompt: String,
    n_predict: i32,
    temperature: f32,
    top_p: f32,
}

#[derive(Deserialize)]
struct CompletionResponse {
    content: String,
}

impl LlamaServerGenerator {
    pub fn new(base_url: String, temperature: f32, top_p: f32, max_tokens: i32) -> Self {
        Self {
            base_url,
            temperature,
            top_p,
            max_tokens,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl TextGenerator for LlamaServerGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/completion", self.base_url);

        let request = CompletionRequest {
            prompt: prompt.to_string(),
            n_predict: self.max_tokens,
            temperature: self.temperature,
            top_p: self.top_p,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .context("Failed to send request to llama-server")?;

        if !response.status().is_success() {
            anyhow::bail!("llama-server request failed: {}", response.status());
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .context("Failed to parse llama-server response")?;

        Ok(completion.content)
    }
}
