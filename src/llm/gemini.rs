//! Gemini API client for the language-model capability
//!
//! Speaks the generateContent function-calling wire format.
//! Uses a long-lived reqwest::Client for connection pooling.

use crate::error::OrchestrationError;
use crate::llm::{LanguageModel, ModelReply, ToolSchema};
use crate::models::{MessageEntry, ToolCall};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{error, info};
use uuid::Uuid;

/// Reusable Gemini client (connection-pooled)
pub struct GeminiModel {
    client: Client,
    api_key: String,
    base_url: String,
}

impl GeminiModel {
    pub fn new(api_key: String) -> Self {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to build HTTP client");

        Self {
            client,
            api_key,
            base_url: "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent".to_string(),
        }
    }

    fn build_contents(history: &[MessageEntry]) -> Vec<Content> {
        history
            .iter()
            .map(|entry| match entry {
                MessageEntry::User { text } => Content {
                    role: "user".to_string(),
                    parts: vec![Part::text(text.clone())],
                },
                MessageEntry::Assistant { text, tool_call } => {
                    let mut parts = Vec::new();
                    if !text.is_empty() {
                        parts.push(Part::text(text.clone()));
                    }
                    if let Some(call) = tool_call {
                        parts.push(Part {
                            text: None,
                            function_call: Some(FunctionCall {
                                name: call.name.clone(),
                                args: call.args.clone(),
                            }),
                            function_response: None,
                        });
                    }
                    if parts.is_empty() {
                        parts.push(Part::text(String::new()));
                    }
                    Content {
                        role: "model".to_string(),
                        parts,
                    }
                }
                MessageEntry::ToolResult {
                    tool_name, content, ..
                } => Content {
                    role: "user".to_string(),
                    parts: vec![Part {
                        text: None,
                        function_call: None,
                        function_response: Some(FunctionResponse {
                            name: tool_name.clone(),
                            response: serde_json::json!({ "content": content }),
                        }),
                    }],
                },
            })
            .collect()
    }
}

#[async_trait::async_trait]
impl LanguageModel for GeminiModel {
    async fn invoke(
        &self,
        system_prompt: &str,
        tools: &[ToolSchema],
        history: &[MessageEntry],
    ) -> crate::Result<ModelReply> {
        if self.api_key.is_empty() {
            return Err(OrchestrationError::ModelError(
                "MODEL_API_KEY not configured".to_string(),
            ));
        }

        let url = format!("{}?key={}", self.base_url, self.api_key);

        let request = GeminiRequest {
            contents: Self::build_contents(history),
            tools: if tools.is_empty() {
                None
            } else {
                Some(vec![ToolDeclarations {
                    function_declarations: tools
                        .iter()
                        .map(|schema| FunctionDeclaration {
                            name: schema.name.to_string(),
                            description: schema.description.clone(),
                            parameters: schema.parameters.clone(),
                        })
                        .collect(),
                }])
            },
            generation_config: GenerationConfig {
                temperature: 0.0,
                top_p: 0.9,
                top_k: 40,
                max_output_tokens: 1024,
            },
            system_instruction: SystemInstruction {
                parts: vec![Part::text(system_prompt.to_string())],
            },
        };

        info!("Calling Gemini API");

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Gemini API request failed: {}", e);
                OrchestrationError::ModelError(format!("Gemini API error: {}", e))
            })?;

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            error!("Gemini API error response: {}", error_text);
            return Err(OrchestrationError::ModelError(format!(
                "Gemini API error: {}",
                error_text
            )));
        }

        let gemini_response: GeminiResponse = response.json().await.map_err(|e| {
            error!("Failed to parse Gemini response: {}", e);
            OrchestrationError::ModelError(format!("Gemini parse error: {}", e))
        })?;

        let Some(candidate) = gemini_response.candidates.into_iter().next() else {
            return Ok(ModelReply::default());
        };

        let mut reply = ModelReply::default();
        for part in candidate.content.parts {
            if let Some(text) = part.text {
                if reply.text.is_empty() {
                    reply.text = text;
                }
            }
            if let Some(call) = part.function_call {
                // Gemini carries no call id; mint the correlation id here so
                // tool results can reference it for the rest of the turn.
                reply.tool_call = Some(ToolCall {
                    id: format!("call-{}", Uuid::new_v4()),
                    name: call.name,
                    args: call.args,
                });
            }
        }

        info!(
            has_tool_call = reply.tool_call.is_some(),
            "Gemini response received"
        );

        Ok(reply)
    }
}

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ToolDeclarations>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
    #[serde(rename = "systemInstruction")]
    system_instruction: SystemInstruction,
}

#[derive(Debug, Serialize)]
struct ToolDeclarations {
    #[serde(rename = "functionDeclarations")]
    function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct FunctionDeclaration {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(rename = "functionCall", skip_serializing_if = "Option::is_none")]
    function_call: Option<FunctionCall>,
    #[serde(rename = "functionResponse", skip_serializing_if = "Option::is_none")]
    function_response: Option<FunctionResponse>,
}

impl Part {
    fn text(text: String) -> Self {
        Self {
            text: Some(text),
            function_call: None,
            function_response: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    #[serde(default)]
    args: Value,
}

#[derive(Debug, Serialize, Deserialize)]
struct FunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
    #[serde(rename = "topP")]
    top_p: f32,
    #[serde(rename = "topK")]
    top_k: i32,
    #[serde(rename = "maxOutputTokens")]
    max_output_tokens: i32,
}

#[derive(Debug, Serialize)]
struct SystemInstruction {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Content,
}
