use std::time::Duration;

/// Error while talking to a remote host.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("client error: {0}")]
    Client(#[source] reqwest::Error),
    #[error("request failed: {0}")]
    Request(#[source] reqwest::Error),
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },
    #[error("failed to read body: {0}")]
    Body(#[source] reqwest::Error),
}

/// User agent sent on every outbound request.
pub const USER_AGENT: &str = concat!("VibeCheck/", env!("CARGO_PKG_VERSION"));

/// Build the blocking HTTP client shared by analysis and texture requests.
///
/// `timeout = None` disables reqwest's default 30 s limit entirely.
pub fn build_client(timeout: Option<Duration>) -> Result<reqwest::blocking::Client, FetchError> {
    reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(FetchError::Client)
}

/// Download `url` fully into memory (blocking).
pub fn fetch_bytes(
    client: &reqwest::blocking::Client,
    url: &str,
) -> Result<Vec<u8>, FetchError> {
    let response = client.get(url).send().map_err(FetchError::Request)?;

    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let bytes = response.bytes().map_err(FetchError::Body)?;
    log::debug!("Fetched {} bytes from {}", bytes.len(), url);
    Ok(bytes.to_vec())
}
