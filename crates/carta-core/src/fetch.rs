//! Content-document fetching.
//!
//! Models name their sources by URL; the [`DocumentFetcher`] trait is the
//! boundary between the runtime and whatever transport the host provides.
//! [`HttpFetcher`] covers the common case (HTTP(S) via a blocking `reqwest`
//! client, plus `file://` URLs read from disk); [`StaticFetcher`] serves
//! canned documents from memory and records what was asked for, which is
//! what the lifecycle tests run against.

use std::collections::HashMap;
use std::fmt;

use parking_lot::Mutex;
use url::Url;

use crate::xml::{parse_xml, XmlDocument};

/// How a model's source document is requested.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TransferMethod {
    /// Plain GET of the source URL.
    #[default]
    Get,
    /// POST with an XML request body.
    Post,
}

impl TransferMethod {
    /// Reads a configuration `method` parameter; anything but `post` is GET.
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some(p) if p.eq_ignore_ascii_case("post") => Self::Post,
            _ => Self::Get,
        }
    }
}

/// How a model expects its fetched payload to be decoded.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PayloadKind {
    /// Structured XML, unless the response declares an image content type.
    #[default]
    Document,
    /// Always stored opaque. Declared by image models, which bypass
    /// structural parsing regardless of what the server labels the bytes.
    Image,
}

/// A fetched document: structured XML or an opaque image.
#[derive(Clone, Debug, PartialEq)]
pub enum ContentDocument {
    /// A parsed, queryable XML document.
    Xml(XmlDocument),
    /// Raw image bytes, passed through untouched.
    Image {
        bytes: Vec<u8>,
        content_type: String,
    },
}

impl ContentDocument {
    /// The XML document, if this content is structured.
    pub fn as_xml(&self) -> Option<&XmlDocument> {
        match self {
            Self::Xml(doc) => Some(doc),
            Self::Image { .. } => None,
        }
    }

    /// Mutable variant of [`as_xml`](Self::as_xml).
    pub fn as_xml_mut(&mut self) -> Option<&mut XmlDocument> {
        match self {
            Self::Xml(doc) => Some(doc),
            Self::Image { .. } => None,
        }
    }
}

/// Errors from fetching or decoding a source document.
#[derive(Debug)]
pub enum FetchError {
    /// The URL did not parse.
    InvalidUrl(String),
    /// The URL scheme has no transport.
    UnsupportedScheme(String),
    /// Transport-level failure.
    Transport { url: String, message: String },
    /// The server answered with a non-success status.
    Status { url: String, code: u16 },
    /// The response body was not parseable XML.
    Decode { url: String, message: String },
    /// No document is registered for the URL (static fetcher).
    NotFound(String),
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl(url) => write!(f, "Invalid URL: {url}"),
            Self::UnsupportedScheme(scheme) => {
                write!(f, "No transport for URL scheme '{scheme}'")
            }
            Self::Transport { url, message } => {
                write!(f, "Transport failure for {url}: {message}")
            }
            Self::Status { url, code } => {
                write!(f, "Server returned status {code} for {url}")
            }
            Self::Decode { url, message } => {
                write!(f, "Could not decode response from {url}: {message}")
            }
            Self::NotFound(url) => write!(f, "No document registered for {url}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// The transport boundary for model source documents.
pub trait DocumentFetcher {
    /// Fetches `url`, POSTing `body` when the method asks for it.
    ///
    /// `payload` is the model's declared expectation: an image model's
    /// bytes come back opaque even when the server labels them otherwise.
    fn fetch(
        &self,
        url: &str,
        method: TransferMethod,
        body: Option<&XmlDocument>,
        payload: PayloadKind,
    ) -> Result<ContentDocument, FetchError>;
}

/// Decides structured-versus-opaque from the model's expectation and the
/// MIME content type.
fn decode_response(
    url: &str,
    content_type: &str,
    bytes: Vec<u8>,
    payload: PayloadKind,
) -> Result<ContentDocument, FetchError> {
    if payload == PayloadKind::Image || content_type.starts_with("image/") {
        return Ok(ContentDocument::Image {
            bytes,
            content_type: content_type.to_string(),
        });
    }
    let text = String::from_utf8_lossy(&bytes);
    let doc = parse_xml(&text).map_err(|e| FetchError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    })?;
    Ok(ContentDocument::Xml(doc))
}

/// Blocking HTTP(S) and `file://` fetcher.
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    /// When set, remote URLs are rewritten as `<proxy><encoded-url>`.
    proxy_prefix: Option<String>,
}

impl HttpFetcher {
    /// Builds a fetcher with a default blocking client.
    pub fn new() -> Result<Self, FetchError> {
        let client = reqwest::blocking::Client::builder()
            .build()
            .map_err(|e| FetchError::Transport {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self {
            client,
            proxy_prefix: None,
        })
    }

    /// Routes remote requests through a same-origin proxy endpoint.
    ///
    /// The target URL is percent-encoded and appended to the prefix, e.g.
    /// `/proxy?url=` + encoded URL.
    pub fn with_proxy(mut self, prefix: impl Into<String>) -> Self {
        self.proxy_prefix = Some(prefix.into());
        self
    }

    fn request_url(&self, url: &Url) -> String {
        match &self.proxy_prefix {
            Some(prefix) => {
                let encoded: String =
                    url::form_urlencoded::byte_serialize(url.as_str().as_bytes()).collect();
                format!("{prefix}{encoded}")
            }
            None => url.as_str().to_string(),
        }
    }

    fn fetch_file(&self, url: &Url, payload: PayloadKind) -> Result<ContentDocument, FetchError> {
        let path = url
            .to_file_path()
            .map_err(|_| FetchError::InvalidUrl(url.as_str().to_string()))?;
        let bytes = std::fs::read(&path).map_err(|e| FetchError::Transport {
            url: url.as_str().to_string(),
            message: e.to_string(),
        })?;
        let content_type = match path.extension().and_then(|e| e.to_str()) {
            Some("png") => "image/png",
            Some("gif") => "image/gif",
            Some("jpg") | Some("jpeg") => "image/jpeg",
            _ => "text/xml",
        };
        decode_response(url.as_str(), content_type, bytes, payload)
    }
}

impl DocumentFetcher for HttpFetcher {
    fn fetch(
        &self,
        url: &str,
        method: TransferMethod,
        body: Option<&XmlDocument>,
        payload: PayloadKind,
    ) -> Result<ContentDocument, FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
        match parsed.scheme() {
            "file" => return self.fetch_file(&parsed, payload),
            "http" | "https" => {}
            other => return Err(FetchError::UnsupportedScheme(other.to_string())),
        }

        let request_url = self.request_url(&parsed);
        let request = match method {
            TransferMethod::Get => self.client.get(&request_url),
            TransferMethod::Post => {
                let payload = body.map(XmlDocument::to_xml).unwrap_or_default();
                self.client
                    .post(&request_url)
                    .header(reqwest::header::CONTENT_TYPE, "text/xml")
                    .body(payload)
            }
        };

        let response = request.send().map_err(|e| FetchError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        })?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                code: status.as_u16(),
            });
        }
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("text/xml")
            .to_string();
        let bytes = response
            .bytes()
            .map_err(|e| FetchError::Transport {
                url: url.to_string(),
                message: e.to_string(),
            })?
            .to_vec();
        decode_response(url, &content_type, bytes, payload)
    }
}

/// In-memory fetcher serving pre-registered documents.
///
/// Records every requested URL, so tests can assert on fetch traffic.
#[derive(Default)]
pub struct StaticFetcher {
    documents: HashMap<String, ContentDocument>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    /// Creates an empty fetcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a document for a URL.
    pub fn insert(&mut self, url: impl Into<String>, doc: ContentDocument) {
        self.documents.insert(url.into(), doc);
    }

    /// Registers an XML source string for a URL. Panics on parse failure.
    pub fn insert_xml(&mut self, url: impl Into<String>, source: &str) {
        let doc = parse_xml(source).expect("static fetcher document must parse");
        self.documents.insert(url.into(), ContentDocument::Xml(doc));
    }

    /// The URLs fetched so far, in request order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

impl DocumentFetcher for StaticFetcher {
    fn fetch(
        &self,
        url: &str,
        _method: TransferMethod,
        _body: Option<&XmlDocument>,
        _payload: PayloadKind,
    ) -> Result<ContentDocument, FetchError> {
        self.requests.lock().push(url.to_string());
        self.documents
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_method_from_param() {
        assert_eq!(TransferMethod::from_param(None), TransferMethod::Get);
        assert_eq!(TransferMethod::from_param(Some("get")), TransferMethod::Get);
        assert_eq!(TransferMethod::from_param(Some("POST")), TransferMethod::Post);
    }

    #[test]
    fn test_decode_image_stays_opaque() {
        let doc =
            decode_response("u", "image/png", vec![1, 2, 3], PayloadKind::Document).unwrap();
        assert!(matches!(doc, ContentDocument::Image { ref bytes, .. } if bytes == &[1, 2, 3]));
    }

    #[test]
    fn test_image_expectation_overrides_content_type() {
        // A mislabeled image source must never reach the XML parser.
        let doc = decode_response(
            "u",
            "application/octet-stream",
            b"not xml at all <".to_vec(),
            PayloadKind::Image,
        )
        .unwrap();
        assert!(matches!(doc, ContentDocument::Image { .. }));
    }

    #[test]
    fn test_decode_xml() {
        let doc = decode_response(
            "u",
            "text/xml",
            b"<a><b>x</b></a>".to_vec(),
            PayloadKind::Document,
        )
        .unwrap();
        let xml = doc.as_xml().unwrap();
        assert_eq!(xml.get("a/b").unwrap().text(), "x");
    }

    #[test]
    fn test_decode_bad_xml_is_an_error() {
        assert!(matches!(
            decode_response(
                "u",
                "text/xml",
                b"not xml at all <".to_vec(),
                PayloadKind::Document
            ),
            Err(FetchError::Decode { .. })
        ));
    }

    #[test]
    fn test_static_fetcher_serves_and_records() {
        let mut fetcher = StaticFetcher::new();
        fetcher.insert_xml("http://test/ctx.xml", "<ViewContext/>");
        let doc = fetcher
            .fetch(
                "http://test/ctx.xml",
                TransferMethod::Get,
                None,
                PayloadKind::Document,
            )
            .unwrap();
        assert!(doc.as_xml().is_some());
        assert!(matches!(
            fetcher.fetch(
                "http://test/other.xml",
                TransferMethod::Get,
                None,
                PayloadKind::Document
            ),
            Err(FetchError::NotFound(_))
        ));
        assert_eq!(
            fetcher.requests(),
            vec!["http://test/ctx.xml", "http://test/other.xml"]
        );
    }

    #[test]
    fn test_proxy_rewrite() {
        let fetcher = HttpFetcher::new().unwrap().with_proxy("http://localhost/proxy?url=");
        let url = Url::parse("http://example.com/context.xml?a=1").unwrap();
        let rewritten = fetcher.request_url(&url);
        assert!(rewritten.starts_with("http://localhost/proxy?url="));
        assert!(!rewritten.contains("example.com/context.xml?a=1"));
    }
}
