use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
    #[error("Unsupported content type: {0}")]
    UnsupportedContentType(String),
    #[error("Encoding error: {0}")]
    Encoding(String),
    #[error("Empty document: {0}")]
    Empty(String),
}

/// Inbound trigger identifying a stored document to process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEvent {
    /// Source URI or object key, e.g. `uploads/report.txt` or
    /// `https://host/leak.txt`.
    pub source: String,
    /// Content-type hint carried by the event, if any.
    pub content_type: Option<String>,
}

impl DocumentEvent {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            content_type: None,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Stable document identity derived from the source key.
    #[must_use]
    pub fn document_id(&self) -> String {
        blake3::hash(self.source.as_bytes()).to_hex().to_string()
    }

    /// Final path segment without extension or query string, for artifact
    /// naming. Falls back to "document" when the source yields nothing.
    #[must_use]
    pub fn stem(&self) -> String {
        let last = self.source.rsplit('/').next().unwrap_or(&self.source);
        let last = last.split('?').next().unwrap_or(last);
        let stem = match last.rfind('.') {
            Some(idx) if idx > 0 => &last[..idx],
            _ => last,
        };
        if stem.is_empty() {
            "document".to_string()
        } else {
            stem.to_string()
        }
    }
}

/// Raw bytes produced by a fetcher, with the content type it resolved.
#[derive(Debug, Clone)]
pub struct DocumentPayload {
    pub source: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl DocumentPayload {
    #[must_use]
    pub fn new(source: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            source: source.into(),
            content_type: None,
            data,
        }
    }

    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// True for content types the pipeline can treat as text. Parameters such
/// as `; charset=utf-8` are ignored.
#[must_use]
pub fn is_text_content_type(content_type: &str) -> bool {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_lowercase();

    essence.starts_with("text/")
        || matches!(essence.as_str(), "application/json" | "application/xml")
}

/// Decodes a payload into document text.
///
/// Accepts text-like content types (or a missing hint), rejects binary ones.
/// UTF-8 decoding falls back to lossy replacement only while less than one
/// character in ten is damaged; anything worse is treated as binary content
/// mislabeled as text. Documents that decode to whitespace are rejected.
pub fn decode_document(payload: &DocumentPayload) -> Result<String, InputError> {
    if let Some(content_type) = &payload.content_type {
        if !is_text_content_type(content_type) {
            return Err(InputError::UnsupportedContentType(content_type.clone()));
        }
    }

    let text = match std::str::from_utf8(&payload.data) {
        Ok(text) => text.to_string(),
        Err(_) => {
            let lossy = String::from_utf8_lossy(&payload.data);
            let total = lossy.chars().count();
            let damaged = lossy.chars().filter(|c| *c == char::REPLACEMENT_CHARACTER).count();
            if total == 0 || damaged * 10 >= total {
                return Err(InputError::Encoding(format!(
                    "{}: {damaged}/{total} undecodable characters",
                    payload.source
                )));
            }
            lossy.into_owned()
        }
    };

    if text.trim().is_empty() {
        return Err(InputError::Empty(payload.source.clone()));
    }

    Ok(text)
}
