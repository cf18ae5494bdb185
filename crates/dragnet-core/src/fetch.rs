use std::path::PathBuf;
use std::time::Duration;

use reqwest::Client;
use url::Url;

use crate::document::{DocumentEvent, DocumentPayload};

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Resolves a document event to its raw bytes.
#[async_trait::async_trait]
pub trait DocumentFetcher: Send + Sync {
    async fn fetch(&self, event: &DocumentEvent) -> FetchResult<DocumentPayload>;
}

/// Fetcher for documents already on local disk. Sources resolve relative to
/// an optional root directory; the content type comes from the event hint or
/// the file extension.
pub struct FsFetcher {
    root: Option<PathBuf>,
}

impl FsFetcher {
    #[must_use]
    pub fn new() -> Self {
        Self { root: None }
    }

    #[must_use]
    pub fn rooted(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    fn resolve(&self, source: &str) -> PathBuf {
        match &self.root {
            Some(root) => root.join(source),
            None => PathBuf::from(source),
        }
    }
}

impl Default for FsFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl DocumentFetcher for FsFetcher {
    async fn fetch(&self, event: &DocumentEvent) -> FetchResult<DocumentPayload> {
        let path = self.resolve(&event.source);
        let data = tokio::fs::read(&path).await?;

        let content_type = event.content_type.clone().or_else(|| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .and_then(content_type_for_extension)
                .map(str::to_string)
        });

        let mut payload = DocumentPayload::new(&event.source, data);
        if let Some(content_type) = content_type {
            payload = payload.with_content_type(content_type);
        }
        Ok(payload)
    }
}

/// Fetcher for documents behind HTTP(S). The content type comes from the
/// response header, falling back to the event hint.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> FetchResult<Self> {
        let client = Client::builder()
            .connect_timeout(DEFAULT_CONNECT_TIMEOUT)
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .user_agent(concat!("dragnet/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl DocumentFetcher for HttpFetcher {
    async fn fetch(&self, event: &DocumentEvent) -> FetchResult<DocumentPayload> {
        let url = Url::parse(&event.source)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl(format!(
                "unsupported scheme: {}",
                event.source
            )));
        }

        let response = self.client.get(url).send().await?.error_for_status()?;

        let header_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let data = response.bytes().await?.to_vec();

        let mut payload = DocumentPayload::new(&event.source, data);
        if let Some(content_type) = header_type.or_else(|| event.content_type.clone()) {
            payload = payload.with_content_type(content_type);
        }
        Ok(payload)
    }
}

fn content_type_for_extension(ext: &str) -> Option<&'static str> {
    match ext.to_lowercase().as_str() {
        "txt" | "log" => Some("text/plain"),
        "md" | "markdown" => Some("text/markdown"),
        "csv" => Some("text/csv"),
        "html" | "htm" => Some("text/html"),
        "json" => Some("application/json"),
        "xml" => Some("application/xml"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}
