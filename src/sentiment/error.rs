use crate::net::http::FetchError;

/// Why an analysis produced no record.
#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("no API key configured (set GEMINI_API_KEY)")]
    MissingApiKey,
    #[error("invalid endpoint {url}: {source}")]
    Endpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
    #[error(transparent)]
    Transport(#[from] FetchError),
    #[error("backend returned HTTP {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("backend reply contained no text")]
    EmptyReply,
    #[error("analysis backend unavailable: {0}")]
    Unavailable(String),
    #[error("analysis worker panicked: {0}")]
    Panicked(String),
    #[error("malformed reply: {0}")]
    Malformed(#[from] serde_json::Error),
}
