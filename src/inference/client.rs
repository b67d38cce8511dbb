//! Ollama vision client for leaf diagnosis.
//!
//! Sends the leaf image to `/api/chat` with a JSON schema in `format`, so
//! the model answers with a structured diagnosis instead of free text.

use crate::models::{Diagnosis, DiseaseInfo};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

/// Errors raised by the inference service.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Request timed out after {0}s")]
    Timeout(u64),

    #[error("Cannot connect to Ollama at {0}. Is Ollama running?")]
    Connect(String),

    #[error("Failed to send request: {0}")]
    Request(String),

    #[error("Ollama API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Model returned a malformed response: {0}")]
    MalformedResponse(String),
}

/// Configuration for the inference client.
#[derive(Debug, Clone)]
pub struct InferenceConfig {
    pub ollama_url: String,
    pub model_name: String,
    pub temperature: f32,
    pub timeout_seconds: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            ollama_url: "http://localhost:11434".to_string(),
            model_name: "gemma3:4b".to_string(),
            temperature: 0.1,
            timeout_seconds: 120,
        }
    }
}

/// Message in the chat request.
#[derive(Debug, Clone, Serialize)]
struct ChatMessage {
    role: String,
    content: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    images: Vec<String>,
}

impl ChatMessage {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: content.to_string(),
            images: Vec::new(),
        }
    }
}

/// Ollama chat API request.
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    format: Value,
    stream: bool,
    options: OllamaOptions,
}

#[derive(Debug, Serialize)]
struct OllamaOptions {
    temperature: f32,
}

/// Ollama chat API response.
#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

#[derive(Debug, Deserialize)]
struct DiseaseLibrary {
    diseases: Vec<DiseaseInfo>,
}

/// Client for the external diagnosis model.
pub struct DiagnosisClient {
    config: InferenceConfig,
    http_client: reqwest::Client,
}

impl DiagnosisClient {
    pub fn new(config: InferenceConfig) -> Result<Self, InferenceError> {
        info!(
            "Initializing diagnosis client with model {} at {}",
            config.model_name, config.ollama_url
        );

        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| InferenceError::Request(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// Diagnose one leaf image given as base64 without the data URL prefix.
    pub async fn analyze(&self, image_base64: &str, mime_type: &str) -> Result<Diagnosis, InferenceError> {
        debug!(
            "Analyzing {} image ({} base64 chars)",
            mime_type,
            image_base64.len()
        );

        let user = ChatMessage {
            role: "user".to_string(),
            content: ANALYZE_PROMPT.to_string(),
            images: vec![image_base64.to_string()],
        };
        let messages = vec![ChatMessage::text("system", DIAGNOSIS_SYSTEM_PROMPT), user];

        let content = self.chat(messages, diagnosis_schema()).await?;
        let diagnosis: Diagnosis = parse_structured(&content)?;

        info!(
            "Diagnosis: {} ({} confidence)",
            diagnosis.disease_name, diagnosis.confidence
        );
        Ok(diagnosis)
    }

    /// Ask the model for a short library of common plant diseases.
    pub async fn common_diseases(&self) -> Result<Vec<DiseaseInfo>, InferenceError> {
        let messages = vec![ChatMessage::text("user", LIBRARY_PROMPT)];
        let content = self.chat(messages, library_schema()).await?;
        let library: DiseaseLibrary = parse_structured(&content)?;

        info!("Loaded {} library entries", library.diseases.len());
        Ok(library.diseases)
    }

    async fn chat(&self, messages: Vec<ChatMessage>, format: Value) -> Result<String, InferenceError> {
        let url = format!("{}/api/chat", self.config.ollama_url.trim_end_matches('/'));

        let request = OllamaChatRequest {
            model: self.config.model_name.clone(),
            messages,
            format,
            stream: false,
            options: OllamaOptions {
                temperature: self.config.temperature,
            },
        };

        let response = self
            .http_client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InferenceError::Timeout(self.config.timeout_seconds)
                } else if e.is_connect() {
                    InferenceError::Connect(self.config.ollama_url.clone())
                } else {
                    InferenceError::Request(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(InferenceError::Api { status, body });
        }

        let chat_response: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| InferenceError::MalformedResponse(e.to_string()))?;

        Ok(chat_response.message.content)
    }
}

/// Parse a model answer, tolerating surrounding whitespace and code fences.
pub fn parse_structured<T: DeserializeOwned>(content: &str) -> Result<T, InferenceError> {
    let body = strip_code_fence(content.trim());
    serde_json::from_str(body).map_err(|e| InferenceError::MalformedResponse(e.to_string()))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the optional language tag on the opening fence.
    let rest = rest.split_once('\n').map(|(_, body)| body).unwrap_or(rest);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

/// JSON schema for a single diagnosis.
pub fn diagnosis_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "isPlant": {
                "type": "boolean",
                "description": "Is the image of a plant leaf? Must be true or false."
            },
            "diseaseName": {
                "type": "string",
                "description": "The common name of the plant disease. If healthy or not a plant, state 'Healthy' or 'Not a Plant Leaf'."
            },
            "confidence": {
                "type": "string",
                "enum": ["High", "Medium", "Low", "N/A"],
                "description": "The confidence level of the diagnosis. 'N/A' if not a plant or healthy."
            },
            "description": {
                "type": "string",
                "description": "A brief, easy-to-understand description of the disease."
            },
            "possibleCauses": {
                "type": "array",
                "items": { "type": "string" },
                "description": "A list of common causes for the disease."
            },
            "recommendedTreatments": {
                "type": "array",
                "items": { "type": "string" },
                "description": "A list of actionable treatment steps or solutions."
            }
        },
        "required": [
            "isPlant",
            "diseaseName",
            "confidence",
            "description",
            "possibleCauses",
            "recommendedTreatments"
        ]
    })
}

/// JSON schema for the disease library.
pub fn library_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "diseases": {
                "type": "array",
                "items": {
                    "type": "object",
                    "properties": {
                        "name": { "type": "string" },
                        "description": { "type": "string" }
                    },
                    "required": ["name", "description"]
                }
            }
        },
        "required": ["diseases"]
    })
}

const DIAGNOSIS_SYSTEM_PROMPT: &str = r#"You are an expert plant pathologist.
You diagnose plant leaf diseases from photographs and answer only with JSON
matching the provided schema."#;

const ANALYZE_PROMPT: &str = "Analyze this image of a plant leaf. Determine if it has a disease. \
If it's not a plant leaf or is healthy, please indicate that. \
Provide a detailed analysis based on the JSON schema.";

const LIBRARY_PROMPT: &str = "Generate a list of 12 common plant diseases. For each disease, \
provide its common name and a brief, one-to-two sentence description suitable for a general \
audience. Format the output as JSON according to the provided schema.";
