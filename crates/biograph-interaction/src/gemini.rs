//! GeminiChatModel - direct REST API implementation of [`ChatModel`].
//!
//! Sends `generateContent` requests with either the knowledge-graph
//! function declarations or the provider-native `google_search` tool
//! enabled, depending on the turn's mode. The two are never combined:
//! the API rejects requests mixing native search with user-defined
//! function declarations.

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use biograph_core::BioGraphError;
use biograph_core::model::{ChatModel, Content, ContentRole, ModelRequest, ModelResponse, Part, TokenUsage};
use biograph_core::tool::ToolCallRequest;

use crate::config::GeminiConfig;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Chat model implementation that talks to the Gemini HTTP API.
#[derive(Clone)]
pub struct GeminiChatModel {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiChatModel {
    /// Creates a new client with the provided API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key: api_key.into(),
            model: DEFAULT_GEMINI_MODEL.to_string(),
        }
    }

    /// Creates a client from a loaded secret configuration.
    pub fn from_config(config: &GeminiConfig) -> Self {
        let mut client = Self::new(config.api_key.clone());
        if let Some(model) = &config.model_name {
            client = client.with_model(model.clone());
        }
        client
    }

    /// Overrides the Gemini model name if needed.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    async fn send_request(
        &self,
        body: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse, BioGraphError> {
        let url = format!(
            "{}/{model}:generateContent?key={api_key}",
            BASE_URL,
            model = self.model,
            api_key = self.api_key
        );

        let response = self.client.post(url).json(body).send().await.map_err(|err| {
            BioGraphError::http(None, format!("Gemini API request failed: {err}"))
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read Gemini error body".to_string());
            return Err(map_http_error(status, body_text));
        }

        response.json().await.map_err(|err| {
            BioGraphError::serialization(format!("Failed to parse Gemini response: {err}"))
        })
    }
}

#[async_trait]
impl ChatModel for GeminiChatModel {
    async fn generate(&self, request: &ModelRequest) -> Result<ModelResponse, BioGraphError> {
        let body = build_request(request);
        let response = self.send_request(&body).await?;
        decode_response(response)
    }
}

fn build_request(request: &ModelRequest) -> GenerateContentRequest {
    let contents = request.contents.iter().map(wire_content).collect();

    let tools = if request.mode.uses_provider_search() {
        vec![WireTool::GoogleSearch {
            google_search: GoogleSearchConfig::default(),
        }]
    } else {
        let declarations: Vec<Value> = request
            .mode
            .declarations()
            .iter()
            .map(|declaration| declaration.to_value())
            .collect();
        vec![WireTool::FunctionDeclarations {
            function_declarations: declarations,
        }]
    };

    let system_instruction = (!request.system_instruction.is_empty()).then(|| WireContent {
        role: "system".to_string(),
        parts: vec![WirePart::Text {
            text: request.system_instruction.clone(),
        }],
    });

    GenerateContentRequest {
        contents,
        tools,
        system_instruction,
    }
}

fn wire_content(content: &Content) -> WireContent {
    let role = match content.role {
        ContentRole::User => "user",
        ContentRole::Model => "model",
    };
    WireContent {
        role: role.to_string(),
        parts: content.parts.iter().map(wire_part).collect(),
    }
}

fn wire_part(part: &Part) -> WirePart {
    match part {
        Part::Text(text) => WirePart::Text { text: text.clone() },
        Part::InlineData { mime_type, data } => WirePart::InlineData {
            inline_data: InlineDataPayload {
                mime_type: mime_type.clone(),
                data: BASE64_STANDARD.encode(data),
            },
        },
        Part::FunctionCall(call) => WirePart::FunctionCall {
            function_call: WireFunctionCall {
                name: call.name.to_string(),
                args: Value::Object(call.args.clone()),
            },
        },
        Part::FunctionResponse { name, response } => WirePart::FunctionResponse {
            function_response: WireFunctionResponse {
                name: name.to_string(),
                response: response.clone(),
            },
        },
    }
}

fn decode_response(response: GenerateContentResponse) -> Result<ModelResponse, BioGraphError> {
    let usage = response
        .usage_metadata
        .map(|metadata| {
            TokenUsage::new(
                metadata.prompt_token_count.unwrap_or(0),
                metadata.candidates_token_count.unwrap_or(0),
            )
        })
        .unwrap_or_default();

    let candidate = response
        .candidates
        .and_then(|mut candidates| {
            if candidates.is_empty() {
                None
            } else {
                Some(candidates.remove(0))
            }
        })
        .ok_or_else(|| {
            BioGraphError::ModelProtocol("Gemini returned no candidates".to_string())
        })?;

    let content = candidate.content.ok_or_else(|| {
        BioGraphError::ModelProtocol("Gemini candidate carried no content".to_string())
    })?;

    let mut texts = Vec::new();
    let mut tool_calls = Vec::new();
    for part in content.parts {
        if let Some(text) = part.text {
            if !text.trim().is_empty() {
                texts.push(text);
            }
        }
        if let Some(call) = part.function_call {
            match call.name.parse() {
                Ok(name) => {
                    let args = match call.args {
                        Some(Value::Object(map)) => map,
                        _ => Map::new(),
                    };
                    tool_calls.push(match call.id {
                        Some(id) => ToolCallRequest::with_id(id, name, args),
                        None => ToolCallRequest::new(name, args),
                    });
                }
                Err(_) => {
                    tracing::warn!(
                        target: "gemini",
                        tool = %call.name,
                        "model requested an undeclared tool; ignoring"
                    );
                }
            }
        }
    }

    Ok(ModelResponse {
        text: (!texts.is_empty()).then(|| texts.join("\n\n")),
        tool_calls,
        usage,
    })
}

#[derive(Serialize)]
struct GenerateContentRequest {
    contents: Vec<WireContent>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool>,
    #[serde(rename = "systemInstruction", skip_serializing_if = "Option::is_none")]
    system_instruction: Option<WireContent>,
}

#[derive(Serialize)]
struct WireContent {
    role: String,
    parts: Vec<WirePart>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WirePart {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: WireFunctionCall,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: WireFunctionResponse,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
struct WireFunctionCall {
    name: String,
    args: Value,
}

#[derive(Serialize)]
struct WireFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireTool {
    FunctionDeclarations {
        #[serde(rename = "functionDeclarations")]
        function_declarations: Vec<Value>,
    },
    GoogleSearch {
        #[serde(rename = "google_search")]
        google_search: GoogleSearchConfig,
    },
}

#[derive(Serialize, Default)]
struct GoogleSearchConfig {}

#[derive(Deserialize)]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    prompt_token_count: Option<u32>,
    candidates_token_count: Option<u32>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
    #[serde(rename = "functionCall")]
    function_call: Option<ResponseFunctionCall>,
}

#[derive(Deserialize)]
struct ResponseFunctionCall {
    name: String,
    args: Option<Value>,
    id: Option<String>,
}

#[derive(Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}

fn map_http_error(status: StatusCode, body: String) -> BioGraphError {
    let message = serde_json::from_str::<ErrorWrapper>(&body)
        .map(|wrapper| {
            let status_text = wrapper.error.status.unwrap_or_default();
            let msg = wrapper.error.message.unwrap_or_else(|| body.clone());
            if status_text.is_empty() {
                msg
            } else {
                format!("{status_text}: {msg}")
            }
        })
        .unwrap_or_else(|_| body.clone());

    BioGraphError::http(Some(status.as_u16()), message)
}
