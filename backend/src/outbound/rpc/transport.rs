//! Shared JSON-over-HTTP plumbing for outbound RPC clients.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::domain::ports::RemoteCallError;
use crate::domain::{Error, TRACE_ID_HEADER, TraceId};

/// Errors raised while building an RPC transport.
#[derive(Debug, thiserror::Error)]
pub enum RpcSetupError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("invalid service URL {url}: {message}")]
    Url { url: String, message: String },
}

/// Reqwest client bound to one service base URL.
#[derive(Clone)]
pub struct JsonRpcTransport {
    client: Client,
    base: Url,
}

impl JsonRpcTransport {
    /// Build a transport with a per-request timeout.
    ///
    /// # Errors
    ///
    /// Returns [`RpcSetupError`] when the URL does not parse or the client
    /// cannot be built.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, RpcSetupError> {
        let client = Client::builder().timeout(timeout).build()?;
        Self::with_client(client, base_url)
    }

    /// Bind an existing client to `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`RpcSetupError::Url`] when the URL does not parse.
    pub fn with_client(client: Client, base_url: &str) -> Result<Self, RpcSetupError> {
        let mut base = Url::parse(base_url).map_err(|err| RpcSetupError::Url {
            url: base_url.to_owned(),
            message: err.to_string(),
        })?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { client, base })
    }

    /// Resolve a path relative to the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, RemoteCallError> {
        self.base
            .join(path.trim_start_matches('/'))
            .map_err(|err| RemoteCallError::transport(format!("invalid path {path}: {err}")))
    }

    /// Append `segments` to the base path, percent-encoding each one.
    ///
    /// Empty, `.` and `..` segments are refused: URL normalisation would
    /// collapse them and route the call somewhere else.
    pub(crate) fn segments_url(&self, segments: &[&str]) -> Result<Url, RemoteCallError> {
        if let Some(bad) = segments
            .iter()
            .find(|segment| matches!(**segment, "" | "." | ".."))
        {
            return Err(RemoteCallError::transport(format!(
                "path segment {bad:?} cannot be routed"
            )));
        }
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| RemoteCallError::transport(format!("{} cannot take a path", self.base)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    pub(crate) fn get(&self, url: Url) -> RequestBuilder {
        with_trace_header(self.client.get(url))
    }

    pub(crate) fn post_json<B: Serialize + ?Sized>(&self, url: Url, body: &B) -> RequestBuilder {
        with_trace_header(self.client.post(url).json(body))
    }

    /// Send `request` and decode a 2xx JSON body into `T`.
    pub(crate) async fn call<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, RemoteCallError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        serde_json::from_slice(body.as_ref())
            .map_err(|err| RemoteCallError::decode(format!("invalid JSON reply: {err}")))
    }

    /// Send `request`, accepting any 2xx status and ignoring the body.
    pub(crate) async fn send(&self, request: RequestBuilder) -> Result<(), RemoteCallError> {
        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        let body = response.bytes().await.map_err(map_transport_error)?;
        Err(map_status_error(status, body.as_ref()))
    }
}

fn with_trace_header(request: RequestBuilder) -> RequestBuilder {
    match TraceId::current() {
        Some(trace_id) => request.header(TRACE_ID_HEADER, trace_id.to_string()),
        None => request,
    }
}

fn map_transport_error(error: reqwest::Error) -> RemoteCallError {
    if error.is_timeout() {
        RemoteCallError::timeout(error.to_string())
    } else {
        RemoteCallError::transport(error.to_string())
    }
}

pub(crate) fn map_status_error(status: StatusCode, body: &[u8]) -> RemoteCallError {
    if let Ok(envelope) = serde_json::from_slice::<Error>(body) {
        debug!(status = status.as_u16(), code = %envelope.code(), "remote error envelope");
        return RemoteCallError::remote(envelope.to_string());
    }

    let preview = body_preview(body);
    let message = if preview.is_empty() {
        format!("status {}", status.as_u16())
    } else {
        format!("status {}: {}", status.as_u16(), preview)
    };
    match status {
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            RemoteCallError::timeout(message)
        }
        _ if status.is_server_error() => RemoteCallError::transport(message),
        _ => RemoteCallError::remote(message),
    }
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
