//! Generative-language backend client (Gemini `generateContent`).
//!
//! One blocking POST per analysis. No retry, no cache: asking about the same
//! topic twice queries the backend twice.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use serde_json::{json, Value};
use url::Url;

use super::{AnalyzeError, Analyzer, RawAnalysis, SentimentRecord, REQUESTED_POSTS};
use crate::config::AppConfig;
use crate::net::http::{build_client, FetchError};

/// Longest backend error message we carry into logs.
const MAX_ERROR_CHARS: usize = 300;

/// Natural-language instruction for `topic`.
pub fn build_prompt(topic: &str) -> String {
    format!(
        "Analyze the current global \"vibe\" and public sentiment regarding the topic: \"{topic}\".\n\
         Provide a sentiment score between -1 (extremely negative/hostile) and 1 (extremely positive/joyful).\n\
         Generate {REQUESTED_POSTS} realistic mock social media posts that reflect this sentiment.\n\
         Also provide a one-sentence summary of the overall mood."
    )
}

/// Structured-output schema the reply must follow.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "score": { "type": "NUMBER", "description": "Sentiment score from -1 to 1" },
            "summary": { "type": "STRING", "description": "Brief summary of the mood" },
            "posts": {
                "type": "ARRAY",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "author": { "type": "STRING" },
                        "handle": { "type": "STRING" },
                        "content": { "type": "STRING" }
                    },
                    "required": ["author", "handle", "content"]
                }
            }
        },
        "required": ["score", "summary", "posts"]
    })
}

/// Full `generateContent` request body for `topic`.
pub fn request_body(topic: &str) -> Value {
    json!({
        "contents": [{ "role": "user", "parts": [{ "text": build_prompt(topic) }] }],
        "generationConfig": {
            "responseMimeType": "application/json",
            "responseSchema": response_schema()
        }
    })
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

/// Concatenated text parts of the first candidate.
pub fn reply_text(envelope: &str) -> Result<String, AnalyzeError> {
    let response: GenerateResponse = serde_json::from_str(envelope)?;
    let text: String = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        return Err(AnalyzeError::EmptyReply);
    }
    Ok(text)
}

/// Parse the model's JSON reply against the declared schema.
pub fn parse_reply(text: &str) -> Result<RawAnalysis, AnalyzeError> {
    Ok(serde_json::from_str(text.trim())?)
}

/// Pull a readable message out of a backend error body.
fn backend_message(body: &str) -> String {
    let message = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string());
    if message.chars().count() > MAX_ERROR_CHARS {
        let cut: String = message.chars().take(MAX_ERROR_CHARS).collect();
        format!("{}...", cut)
    } else {
        message
    }
}

fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or(0)
}

/// Blocking client for the Gemini REST API.
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    endpoint: Url,
    api_key: Option<String>,
}

impl GeminiClient {
    pub fn new(config: &AppConfig) -> Result<Self, AnalyzeError> {
        let http = build_client(config.request_timeout)?;
        Self::with_http(config, http)
    }

    /// Use a caller-built HTTP client (custom proxy or TLS settings).
    pub fn with_http(
        config: &AppConfig,
        http: reqwest::blocking::Client,
    ) -> Result<Self, AnalyzeError> {
        let raw = format!(
            "{}/v1beta/models/{}:generateContent",
            config.api_base, config.model
        );
        let endpoint = Url::parse(&raw).map_err(|source| AnalyzeError::Endpoint {
            url: raw.clone(),
            source,
        })?;

        if config.api_key.is_none() {
            log::warn!("No API key configured; every analysis will fail until GEMINI_API_KEY is set");
        }

        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl Analyzer for GeminiClient {
    fn analyze(&self, topic: &str) -> Result<SentimentRecord, AnalyzeError> {
        let key = self.api_key.as_deref().ok_or(AnalyzeError::MissingApiKey)?;
        log::debug!("Analyzing {:?} via {}", topic, self.endpoint);

        let response = self
            .http
            .post(self.endpoint.clone())
            .header("x-goog-api-key", key)
            .json(&request_body(topic))
            .send()
            .map_err(FetchError::Request)?;

        let status = response.status();
        let body = response.text().map_err(FetchError::Body)?;
        if !status.is_success() {
            return Err(AnalyzeError::Backend {
                status: status.as_u16(),
                message: backend_message(&body),
            });
        }

        let text = reply_text(&body)?;
        let raw = parse_reply(&text)?;
        Ok(SentimentRecord::from_raw(raw, now_millis()))
    }
}

/// Stands in for a client that could not be built. Every analysis fails
/// with the construction error, so the UI stays up and keeps its state.
pub struct Unavailable {
    reason: String,
}

impl Unavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl Analyzer for Unavailable {
    fn analyze(&self, _topic: &str) -> Result<SentimentRecord, AnalyzeError> {
        Err(AnalyzeError::Unavailable(self.reason.clone()))
    }
}

/// The configured analyzer, or [`Unavailable`] when the client cannot be built.
pub fn connect(config: &AppConfig) -> Arc<dyn Analyzer> {
    match GeminiClient::new(config) {
        Ok(client) => Arc::new(client),
        Err(e) => {
            log::error!("Sentiment client unavailable: {}", e);
            Arc::new(Unavailable::new(e.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sentiment::{PostSentiment, Trend};
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;

    fn envelope(text: &str) -> String {
        json!({ "candidates": [{ "content": { "parts": [{ "text": text }] } }] }).to_string()
    }

    const TEST_A: &str = r#"{"score": 0.6, "summary": "ok", "posts": [
        {"author": "Ada", "handle": "ada", "content": "a"},
        {"author": "Bo", "handle": "bo", "content": "b"},
        {"author": "Cy", "handle": "cy", "content": "c"},
        {"author": "Di", "handle": "di", "content": "d"},
        {"author": "Ed", "handle": "ed", "content": "e"}]}"#;

    #[test]
    fn prompt_embeds_topic() {
        let p = build_prompt("Test A");
        assert!(p.contains("\"Test A\""));
        assert!(p.contains("Generate 5 realistic"));
    }

    #[test]
    fn schema_requires_fields() {
        let body = request_body("x");
        let schema = &body["generationConfig"]["responseSchema"];
        assert_eq!(schema["required"], json!(["score", "summary", "posts"]));
        assert_eq!(
            schema["properties"]["posts"]["items"]["required"],
            json!(["author", "handle", "content"])
        );
        assert!(schema["properties"]["posts"].get("minItems").is_none());
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
    }

    #[test]
    fn reply_text_joins_parts() {
        let env = json!({ "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }] });
        assert_eq!(reply_text(&env.to_string()).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn empty_candidates_is_an_error() {
        assert!(matches!(reply_text("{\"candidates\": []}"), Err(AnalyzeError::EmptyReply)));
        assert!(matches!(reply_text("{}"), Err(AnalyzeError::EmptyReply)));
    }

    #[test]
    fn parses_test_a() {
        let raw = parse_reply(TEST_A).unwrap();
        assert_eq!(raw.posts.len(), 5);
        let rec = SentimentRecord::from_raw(raw, 7);
        assert_eq!(rec.trend, Trend::Up);
        assert!(rec.posts.iter().all(|p| p.sentiment == PostSentiment::Positive));
    }

    #[test]
    fn malformed_json_fails() {
        assert!(matches!(parse_reply("{score: 0.6"), Err(AnalyzeError::Malformed(_))));
    }

    #[test]
    fn missing_field_fails() {
        let text = r#"{"score": 0.1, "posts": []}"#;
        assert!(matches!(parse_reply(text), Err(AnalyzeError::Malformed(_))));
        let text = r#"{"score": 0.1, "summary": "s", "posts": [{"author": "a", "content": "c"}]}"#;
        assert!(matches!(parse_reply(text), Err(AnalyzeError::Malformed(_))));
    }

    #[test]
    fn backend_message_prefers_error_field() {
        let body = r#"{"error": {"code": 403, "message": "API key not valid"}}"#;
        assert_eq!(backend_message(body), "API key not valid");
        assert_eq!(backend_message("plain failure"), "plain failure");
        assert!(backend_message(&"x".repeat(1000)).ends_with("..."));
    }

    #[test]
    fn missing_key_fails_without_network() {
        let client = GeminiClient::new(&AppConfig::default()).unwrap();
        assert!(matches!(client.analyze("Test A"), Err(AnalyzeError::MissingApiKey)));
    }

    #[test]
    fn bad_base_degrades_to_unavailable() {
        let config = AppConfig {
            api_base: "not a url".to_string(),
            api_key: Some("k".to_string()),
            ..AppConfig::default()
        };
        assert!(matches!(
            GeminiClient::new(&config),
            Err(AnalyzeError::Endpoint { .. })
        ));
        let analyzer = connect(&config);
        assert!(matches!(
            analyzer.analyze("Test A"),
            Err(AnalyzeError::Unavailable(_))
        ));
    }

    #[test]
    fn endpoint_includes_model() {
        let client = GeminiClient::new(&AppConfig::default()).unwrap();
        assert_eq!(
            client.endpoint().as_str(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-3-flash-preview:generateContent"
        );
    }

    /// Serve exactly one canned HTTP response and hand back the raw request head.
    fn serve_once(status: &'static str, body: String) -> (String, std::thread::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                if let Some(v) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                    content_length = v.trim().parse().unwrap();
                }
                if line == "\r\n" || line.is_empty() {
                    break;
                }
                head.push_str(&line);
            }
            let mut req_body = vec![0u8; content_length];
            reader.read_exact(&mut req_body).unwrap();
            let mut stream = stream;
            write!(
                stream,
                "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            )
            .unwrap();
            head
        });
        (base, handle)
    }

    fn local_config(base: String) -> AppConfig {
        AppConfig {
            api_key: Some("test-key".into()),
            api_base: base,
            ..AppConfig::default()
        }
    }

    fn local_client(base: String) -> GeminiClient {
        let http = reqwest::blocking::Client::builder().no_proxy().build().unwrap();
        GeminiClient::with_http(&local_config(base), http).unwrap()
    }

    #[test]
    fn analyze_against_local_backend() {
        let (base, server) = serve_once("200 OK", envelope(TEST_A));
        let client = local_client(base);
        let rec = client.analyze("Test A").unwrap();
        assert!((rec.score - 0.6).abs() < 1e-6);
        assert_eq!(rec.summary, "ok");
        assert_eq!(rec.posts.len(), 5);

        let head = server.join().unwrap().to_ascii_lowercase();
        assert!(head.starts_with("post /v1beta/models/gemini-3-flash-preview:generatecontent"));
        assert!(head.contains("x-goog-api-key: test-key"));
    }

    #[test]
    fn backend_error_status_surfaces() {
        let (base, server) = serve_once(
            "403 Forbidden",
            r#"{"error": {"message": "API key not valid"}}"#.to_string(),
        );
        let client = local_client(base);
        match client.analyze("Test A") {
            Err(AnalyzeError::Backend { status, message }) => {
                assert_eq!(status, 403);
                assert_eq!(message, "API key not valid");
            }
            other => panic!("expected backend error, got {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn malformed_reply_text_surfaces() {
        let (base, server) = serve_once("200 OK", envelope("{\"score\": "));
        let client = local_client(base);
        assert!(matches!(client.analyze("Test C"), Err(AnalyzeError::Malformed(_))));
        server.join().unwrap();
    }
}
