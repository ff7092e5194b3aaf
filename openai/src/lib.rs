//! Minimal OpenAI chat completions client.
//!
//! This crate provides a focused client for the Chat Completions API with:
//! - The public OpenAI endpoint (bearer auth)
//! - Azure OpenAI deployments (`api-key` header, `api-version` query)
//! - A bounded request timeout so callers never hang on a slow backend

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

const API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

/// Default `api-version` for Azure OpenAI deployments.
pub const DEFAULT_AZURE_API_VERSION: &str = "2024-02-15-preview";

/// Errors that can occur when using the client.
#[derive(Debug, Error)]
pub enum Error {
    #[error("API key not configured")]
    NoApiKey,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Where requests are sent and how they authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
    /// The public OpenAI API (or any compatible base URL).
    OpenAi { base_url: String },
    /// An Azure OpenAI resource serving one deployment.
    Azure {
        endpoint: String,
        deployment: String,
        api_version: String,
    },
}

impl Endpoint {
    /// Full URL of the chat completions route.
    pub fn completions_url(&self) -> String {
        match self {
            Endpoint::OpenAi { base_url } => {
                format!("{}/chat/completions", base_url.trim_end_matches('/'))
            }
            Endpoint::Azure {
                endpoint,
                deployment,
                api_version,
            } => format!(
                "{}/openai/deployments/{deployment}/chat/completions?api-version={api_version}",
                endpoint.trim_end_matches('/')
            ),
        }
    }

    fn is_azure(&self) -> bool {
        matches!(self, Endpoint::Azure { .. })
    }
}

/// Chat completions client.
#[derive(Clone)]
pub struct Client {
    client: reqwest::Client,
    api_key: String,
    endpoint: Endpoint,
    model: String,
    timeout: Duration,
}

impl Client {
    /// Create a client for the public OpenAI API.
    pub fn openai(api_key: impl Into<String>) -> Result<Self, Error> {
        Self::with_endpoint(
            api_key,
            Endpoint::OpenAi {
                base_url: API_BASE.to_string(),
            },
        )
    }

    /// Create a client for an Azure OpenAI deployment.
    pub fn azure(
        endpoint: impl Into<String>,
        deployment: impl Into<String>,
        api_version: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, Error> {
        Self::with_endpoint(
            api_key,
            Endpoint::Azure {
                endpoint: endpoint.into(),
                deployment: deployment.into(),
                api_version: api_version.into(),
            },
        )
    }

    /// Create a client against an explicit endpoint.
    pub fn with_endpoint(api_key: impl Into<String>, endpoint: Endpoint) -> Result<Self, Error> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(Error::NoApiKey);
        }
        Ok(Self {
            client: build_http_client(DEFAULT_TIMEOUT)?,
            api_key,
            endpoint,
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        })
    }

    /// Set the default model for this client. Ignored by Azure, which routes by deployment.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Replace the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, Error> {
        self.client = build_http_client(timeout)?;
        self.timeout = timeout;
        Ok(self)
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a completion request and return the full response.
    pub async fn complete(&self, request: Request) -> Result<Response, Error> {
        let api_request = self.build_api_request(&request);
        let headers = self.build_headers()?;

        let response = self
            .client
            .post(self.endpoint.completions_url())
            .headers(headers)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Api {
                status,
                message: body,
            });
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| Error::Parse(e.to_string()))?;

        parse_response(api_response)
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout(self.timeout)
        } else {
            Error::Network(e.to_string())
        }
    }

    fn build_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        match &self.endpoint {
            Endpoint::OpenAi { .. } => {
                headers.insert(
                    AUTHORIZATION,
                    HeaderValue::from_str(&format!("Bearer {}", self.api_key))
                        .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
                );
            }
            Endpoint::Azure { .. } => {
                headers.insert(
                    "api-key",
                    HeaderValue::from_str(&self.api_key)
                        .map_err(|e| Error::Config(format!("Invalid API key: {e}")))?,
                );
            }
        }
        Ok(headers)
    }

    fn build_api_request(&self, request: &Request) -> ApiRequest {
        let messages = request
            .messages
            .iter()
            .map(|m| ApiMessage {
                role: m.role.as_str().to_string(),
                content: m.content.clone(),
            })
            .collect();

        // Azure selects the model through the deployment name.
        let model = if self.endpoint.is_azure() {
            None
        } else {
            Some(self.model.clone())
        };

        ApiRequest {
            model,
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            response_format: request.json_object.then(|| ApiResponseFormat {
                r#type: "json_object".to_string(),
            }),
        }
    }
}

fn build_http_client(timeout: Duration) -> Result<reqwest::Client, Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .build()
        .map_err(|e| Error::Config(format!("Failed to build HTTP client: {e}")))
}

fn parse_response(api_response: ApiResponse) -> Result<Response, Error> {
    let choice = api_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| Error::Parse("response contained no choices".to_string()))?;

    Ok(Response {
        content: choice.message.content.unwrap_or_default(),
    })
}

// ============================================================================
// Public types
// ============================================================================

/// A completion request.
#[derive(Debug, Clone)]
pub struct Request {
    pub max_tokens: usize,
    pub messages: Vec<Message>,
    pub temperature: Option<f32>,
    /// Ask the service to constrain output to a single JSON object.
    pub json_object: bool,
}

impl Request {
    /// Create a new request with the given messages.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            max_tokens: 1024,
            messages,
            temperature: None,
            json_object: false,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_json_object(mut self) -> Self {
        self.json_object = true;
        self
    }
}

/// A message in the conversation.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(text: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: text.into(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    System,
    User,
}

impl Role {
    fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
        }
    }
}

/// A completion response.
#[derive(Debug, Clone)]
pub struct Response {
    /// Text of the first choice.
    pub content: String,
}

impl Response {
    pub fn text(&self) -> &str {
        self.content.trim()
    }
}

// ============================================================================
// Internal API types
// ============================================================================

#[derive(Debug, Serialize)]
struct ApiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    model: Option<String>,
    messages: Vec<ApiMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ApiResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: String,
    content: String,
}

#[derive(Debug, Serialize)]
struct ApiResponseFormat {
    r#type: String,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ApiChoiceMessage {
    content: Option<String>,
}
