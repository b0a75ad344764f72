use futures::StreamExt;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::time::Instant;
use thiserror::Error;

use super::parser::parse_breakdown;
use super::prompt::{build_prompt, PromptOptions};
use super::{Breakdown, GroundingSource};

/// Public Gemini API endpoint.
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

const DEFAULT_MODEL: &str = "gemini-2.5-flash";

/// Grounded responses carry long metadata blocks, but nothing near this size.
const MAX_RESPONSE_SIZE: usize = 8 * 1024 * 1024; // 8MB

// ============================================================================
// Error Types
// ============================================================================

/// Low-level failure talking to the generation service.
#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    #[error("Response too large (exceeds {0} bytes)")]
    ResponseTooLarge(usize),
    #[error("Invalid response body: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBaseUrl,
}

/// The service call itself failed.
///
/// Displays a generic message; the underlying `GeminiError` is the source.
/// A call that succeeds but yields unusable text is not a `FetchError`, it
/// returns `Breakdown { data: None, .. }` instead.
#[derive(Debug, Error)]
#[error("Failed to fetch news breakdown.")]
pub struct FetchError(#[from] GeminiError);

impl FetchError {
    pub fn cause(&self) -> &GeminiError {
        &self.0
    }
}

// ============================================================================
// Source Seam
// ============================================================================

/// Anything that can produce a news breakdown.
///
/// Implementations perform exactly one attempt per call; retrying is the
/// caller's decision.
pub trait BreakdownSource {
    type Error: std::error::Error + Send + Sync + 'static;

    fn fetch_breakdown(&self) -> impl Future<Output = Result<Breakdown, Self::Error>> + Send;
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<[Tool; 1]>,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Serialize)]
struct GoogleSearch {}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
    /// Thinking-model summaries; never part of the answer text.
    thought: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GroundingMetadata {
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

impl GenerateResponse {
    /// Answer text of the first candidate: all non-thought text parts joined.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter(|p| !p.thought)
                    .filter_map(|p| p.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
    }

    /// Web citations of the first candidate with both uri and title present.
    fn sources(&self) -> Vec<GroundingSource> {
        self.candidates
            .first()
            .and_then(|c| c.grounding_metadata.as_ref())
            .map(|meta| {
                meta.grounding_chunks
                    .iter()
                    .filter_map(|chunk| chunk.web.as_ref())
                    .filter_map(|web| match (web.uri.as_deref(), web.title.as_deref()) {
                        (Some(uri), Some(title)) if !uri.is_empty() && !title.is_empty() => {
                            Some(GroundingSource {
                                uri: uri.to_string(),
                                title: title.to_string(),
                            })
                        }
                        _ => None,
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

// ============================================================================
// Client
// ============================================================================

/// Client for the Gemini `generateContent` endpoint.
///
/// Constructed explicitly from configuration; the prompt is built once at
/// construction time since it does not change between refreshes.
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    search_grounding: bool,
    prompt: String,
}

impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .field("search_grounding", &self.search_grounding)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl GeminiClient {
    pub fn new(http: reqwest::Client, api_key: SecretString) -> Self {
        Self {
            http,
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            search_grounding: true,
            prompt: build_prompt(&PromptOptions::default()),
        }
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    /// Point the client at a different API host.
    ///
    /// HTTPS is required so the API key never travels in clear text;
    /// plain HTTP is accepted for localhost test servers only.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, GeminiError> {
        let base = base_url.trim_end_matches('/');
        if !base.starts_with("https://") {
            let is_localhost =
                base.starts_with("http://127.0.0.1") || base.starts_with("http://localhost");
            if !is_localhost {
                tracing::error!(base_url = %base, "Rejecting non-HTTPS Gemini base URL");
                return Err(GeminiError::InsecureBaseUrl);
            }
            tracing::warn!(base_url = %base, "Using non-HTTPS Gemini base URL (localhost only)");
        }
        self.base_url = base.to_string();
        Ok(self)
    }

    pub fn with_search_grounding(mut self, enabled: bool) -> Self {
        self.search_grounding = enabled;
        self
    }

    pub fn with_prompt(mut self, options: &PromptOptions) -> Self {
        self.prompt = build_prompt(options);
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    /// Issue one generation request and parse its answer.
    pub async fn fetch(&self) -> Result<Breakdown, FetchError> {
        let started = Instant::now();
        let response = match self.generate().await {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(error = %e, model = %self.model, "Error fetching news from Gemini API");
                return Err(FetchError::from(e));
            }
        };

        let text = response.text();
        let sources = response.sources();
        let data = parse_breakdown(&text);

        tracing::info!(
            model = %self.model,
            elapsed_ms = started.elapsed().as_millis() as u64,
            text_len = text.len(),
            parsed = data.is_some(),
            sources = sources.len(),
            "Gemini breakdown request complete"
        );

        Ok(Breakdown { data, sources })
    }

    async fn generate(&self) -> Result<GenerateResponse, GeminiError> {
        let body = GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart {
                    text: &self.prompt,
                }],
            }],
            tools: self.search_grounding.then(|| {
                [Tool {
                    google_search: GoogleSearch {},
                }]
            }),
        };

        tracing::debug!(
            endpoint = %self.endpoint(),
            search_grounding = self.search_grounding,
            "Sending generateContent request"
        );

        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(GeminiError::HttpStatus(response.status().as_u16()));
        }

        let bytes = read_limited_bytes(response, MAX_RESPONSE_SIZE).await?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

impl BreakdownSource for GeminiClient {
    type Error = FetchError;

    fn fetch_breakdown(&self) -> impl Future<Output = Result<Breakdown, FetchError>> + Send {
        self.fetch()
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, GeminiError> {
    if let Some(len) = response.content_length() {
        if len as usize > limit {
            return Err(GeminiError::ResponseTooLarge(limit));
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(GeminiError::ResponseTooLarge(limit));
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}
