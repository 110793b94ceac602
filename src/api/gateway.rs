//! Purpose: Provide an HTTP transport for a bulletin board JSON gateway (`/v0/*`).
//! Exports: `GatewayTransport`.
//! Role: Concrete `Transport` that maps each typed primitive onto one request.
//! Role: Talks to an HTTP gateway in front of the board, not to the board's
//! native stream socket.
//! Invariants: The gateway address resolves to an http(s) base URL without a path.
//! Invariants: Status, board and info payloads stay positional tuples on the wire.
//! Invariants: Error envelopes map onto `ErrorKind` unchanged; no retries.
#![allow(clippy::result_large_err)]

use super::ApiResult;
use super::transport::Transport;
use crate::core::error::{Error, ErrorKind, parse_error_kind};
use crate::core::records::{RawBoardEntry, RawBulletinEntry, RawStatus};
use crate::core::typed::{Shaped, TypedValue};
use crate::core::value::Complex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use url::Url;

#[derive(Clone)]
pub struct GatewayTransport {
    inner: Arc<GatewayTransportInner>,
}

struct GatewayTransportInner {
    base_url: Url,
    token: Option<String>,
    agent: ureq::Agent,
}

impl std::fmt::Debug for GatewayTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayTransport")
            .field("base_url", &self.inner.base_url.as_str())
            .field("token", &self.inner.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Outgoing value; borrows the caller's buffers.
#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireValueRef<'a> {
    Integer { value: i64 },
    Real { value: f64 },
    Complex { value: Complex },
    String { value: &'a str },
    IntegerArray { data: &'a [i64], shape: &'a [usize] },
    RealArray { data: &'a [f64], shape: &'a [usize] },
    ComplexArray { data: &'a [Complex], shape: &'a [usize] },
    StringArray { data: &'a [String], shape: &'a [usize] },
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireValue {
    Integer { value: i64 },
    Real { value: f64 },
    Complex { value: Complex },
    String { value: String },
    IntegerArray { data: Vec<i64>, shape: Vec<usize> },
    RealArray { data: Vec<f64>, shape: Vec<usize> },
    ComplexArray { data: Vec<Complex>, shape: Vec<usize> },
    StringArray { data: Vec<String>, shape: Vec<usize> },
}

impl From<WireValue> for TypedValue {
    fn from(wire: WireValue) -> Self {
        match wire {
            WireValue::Integer { value } => TypedValue::IntegerScalar(value),
            WireValue::Real { value } => TypedValue::RealScalar(value),
            WireValue::Complex { value } => TypedValue::ComplexScalar(value),
            WireValue::String { value } => TypedValue::StringScalar(value),
            WireValue::IntegerArray { data, shape } => {
                TypedValue::IntegerArray(Shaped::new(data, shape))
            }
            WireValue::RealArray { data, shape } => TypedValue::RealArray(Shaped::new(data, shape)),
            WireValue::ComplexArray { data, shape } => {
                TypedValue::ComplexArray(Shaped::new(data, shape))
            }
            WireValue::StringArray { data, shape } => {
                TypedValue::StringArray(Shaped::new(data, shape))
            }
        }
    }
}

#[derive(Serialize)]
struct PostRequest<'a> {
    title: &'a str,
    tag: &'a str,
    value: WireValueRef<'a>,
}

#[derive(Serialize)]
struct ReadRequest<'a> {
    title: &'a str,
    tag: Option<&'a str>,
    revisions: &'a [u64],
}

#[derive(Serialize)]
struct BulletinRequest<'a> {
    title: &'a str,
    tag: Option<&'a str>,
}

#[derive(Serialize)]
struct ClearRevisionsRequest<'a> {
    title: &'a str,
    tag: Option<&'a str>,
    revisions: &'a [u64],
}

#[derive(Serialize)]
struct RelabelRequest<'a> {
    title_from: &'a str,
    tag_from: Option<&'a str>,
    title_to: Option<&'a str>,
    tag_to: Option<&'a str>,
}

#[derive(Serialize)]
struct ArchiveRequest<'a> {
    acv_name: &'a str,
    title: &'a str,
    tag: Option<&'a str>,
}

#[derive(Serialize)]
struct ArchiveNameRequest<'a> {
    acv_name: &'a str,
}

#[derive(Serialize)]
struct RenameArchiveRequest<'a> {
    name_from: &'a str,
    name_to: &'a str,
}

#[derive(Deserialize)]
struct ReadEnvelope {
    entries: Vec<WireValue>,
}

#[derive(Deserialize)]
struct StatusEnvelope {
    status: RawStatus,
}

#[derive(Deserialize)]
struct BoardEnvelope {
    board: Vec<RawBoardEntry>,
}

#[derive(Deserialize)]
struct InfoEnvelope {
    revisions: Vec<RawBulletinEntry>,
}

#[derive(Deserialize)]
struct ArchivesEnvelope {
    archives: Vec<String>,
}

#[derive(Deserialize)]
struct LogEnvelope {
    log: String,
}

#[derive(Deserialize)]
struct VersionEnvelope {
    version: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: RemoteError,
}

#[derive(Deserialize)]
struct RemoteError {
    kind: String,
    message: Option<String>,
    hint: Option<String>,
    title: Option<String>,
    tag: Option<String>,
    revision: Option<u64>,
}

impl GatewayTransport {
    /// Accepts `host:port` or an `http(s)://host:port` URL.
    pub fn new(addr: impl Into<String>) -> ApiResult<Self> {
        let base_url = normalize_addr(addr.into())?;
        let agent = ureq::AgentBuilder::new().build();
        Ok(Self {
            inner: Arc::new(GatewayTransportInner {
                base_url,
                token: None,
                agent,
            }),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        if let Some(inner) = Arc::get_mut(&mut self.inner) {
            inner.token = Some(token.into());
        } else {
            self.inner = Arc::new(GatewayTransportInner {
                base_url: self.inner.base_url.clone(),
                token: Some(token.into()),
                agent: self.inner.agent.clone(),
            });
        }
        self
    }

    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    fn post_value(&self, title: &str, tag: &str, value: WireValueRef<'_>) -> ApiResult<()> {
        let payload = PostRequest { title, tag, value };
        self.send_ack("POST", &["v0", "post"], &payload)
            .map_err(|err| err.with_bulletin(title, Some(tag)))
    }

    fn get_json<R: DeserializeOwned>(&self, segments: &[&str]) -> ApiResult<R> {
        let url = build_url(&self.inner.base_url, segments)?;
        self.request_json::<(), R>("GET", &url, &())
    }

    fn post_json<T: Serialize, R: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &T,
    ) -> ApiResult<R> {
        let url = build_url(&self.inner.base_url, segments)?;
        self.request_json("POST", &url, body)
    }

    fn send_ack<T: Serialize>(&self, method: &str, segments: &[&str], body: &T) -> ApiResult<()> {
        let url = build_url(&self.inner.base_url, segments)?;
        let response = self.send(method, &url, body)?;
        response.into_string().map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read response body")
                .with_source(err)
        })?;
        Ok(())
    }

    fn request_json<T, R>(&self, method: &str, url: &Url, body: &T) -> ApiResult<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let response = self.send(method, url, body)?;
        read_json_response(response)
    }

    fn send<T: Serialize>(&self, method: &str, url: &Url, body: &T) -> ApiResult<ureq::Response> {
        tracing::debug!(method, url = %url, "board request");
        let request = self.request(method, url).set("Accept", "application/json");
        let response = if method == "GET" {
            request.call()
        } else {
            let payload = serde_json::to_string(body).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode request json")
                    .with_source(err)
            })?;
            request
                .set("Content-Type", "application/json")
                .send_string(&payload)
        };

        match response {
            Ok(resp) => Ok(resp),
            Err(ureq::Error::Status(code, resp)) => {
                tracing::debug!(status = code, url = %url, "board returned an error");
                Err(parse_error_response(code, resp))
            }
            Err(ureq::Error::Transport(err)) => Err(Error::new(ErrorKind::Io)
                .with_message("request failed")
                .with_hint(format!("Is a board gateway listening at {}?", self.inner.base_url))
                .with_source(err)),
        }
    }

    fn request(&self, method: &str, url: &Url) -> ureq::Request {
        let mut request = self.inner.agent.request(method, url.as_str());
        if let Some(token) = &self.inner.token {
            request = request.set("Authorization", &format!("Bearer {token}"));
        }
        request
    }
}

impl Transport for GatewayTransport {
    fn post_integer(&self, title: &str, tag: &str, value: i64) -> ApiResult<()> {
        self.post_value(title, tag, WireValueRef::Integer { value })
    }

    fn post_real(&self, title: &str, tag: &str, value: f64) -> ApiResult<()> {
        self.post_value(title, tag, WireValueRef::Real { value })
    }

    fn post_complex(&self, title: &str, tag: &str, value: Complex) -> ApiResult<()> {
        self.post_value(title, tag, WireValueRef::Complex { value })
    }

    fn post_string(&self, title: &str, tag: &str, value: &str) -> ApiResult<()> {
        self.post_value(title, tag, WireValueRef::String { value })
    }

    fn post_integer_array(
        &self,
        title: &str,
        tag: &str,
        data: &[i64],
        shape: &[usize],
    ) -> ApiResult<()> {
        self.post_value(title, tag, WireValueRef::IntegerArray { data, shape })
    }

    fn post_real_array(
        &self,
        title: &str,
        tag: &str,
        data: &[f64],
        shape: &[usize],
    ) -> ApiResult<()> {
        self.post_value(title, tag, WireValueRef::RealArray { data, shape })
    }

    fn post_complex_array(
        &self,
        title: &str,
        tag: &str,
        data: &[Complex],
        shape: &[usize],
    ) -> ApiResult<()> {
        self.post_value(title, tag, WireValueRef::ComplexArray { data, shape })
    }

    fn post_string_array(
        &self,
        title: &str,
        tag: &str,
        data: &[String],
        shape: &[usize],
    ) -> ApiResult<()> {
        self.post_value(title, tag, WireValueRef::StringArray { data, shape })
    }

    fn read_raw(
        &self,
        title: &str,
        tag: Option<&str>,
        revisions: &[u64],
    ) -> ApiResult<Vec<TypedValue>> {
        let payload = ReadRequest {
            title,
            tag,
            revisions,
        };
        let envelope: ReadEnvelope = self
            .post_json(&["v0", "read"], &payload)
            .map_err(|err| err.with_bulletin(title, tag))?;
        Ok(envelope.entries.into_iter().map(TypedValue::from).collect())
    }

    fn status_raw(&self) -> ApiResult<RawStatus> {
        let envelope: StatusEnvelope = self.get_json(&["v0", "status"])?;
        Ok(envelope.status)
    }

    fn view_board_raw(&self) -> ApiResult<Vec<RawBoardEntry>> {
        let envelope: BoardEnvelope = self.get_json(&["v0", "board"])?;
        Ok(envelope.board)
    }

    fn get_info_raw(&self, title: &str, tag: Option<&str>) -> ApiResult<Vec<RawBulletinEntry>> {
        let envelope: InfoEnvelope = self
            .post_json(&["v0", "info"], &BulletinRequest { title, tag })
            .map_err(|err| err.with_bulletin(title, tag))?;
        Ok(envelope.revisions)
    }

    fn clear_revisions(
        &self,
        title: &str,
        tag: Option<&str>,
        revisions: &[u64],
    ) -> ApiResult<()> {
        let payload = ClearRevisionsRequest {
            title,
            tag,
            revisions,
        };
        self.send_ack("POST", &["v0", "clear_revisions"], &payload)
            .map_err(|err| err.with_bulletin(title, tag))
    }

    fn remove(&self, title: &str, tag: Option<&str>) -> ApiResult<()> {
        self.send_ack("POST", &["v0", "remove"], &BulletinRequest { title, tag })
            .map_err(|err| err.with_bulletin(title, tag))
    }

    fn relabel(
        &self,
        title_from: &str,
        tag_from: Option<&str>,
        title_to: Option<&str>,
        tag_to: Option<&str>,
    ) -> ApiResult<()> {
        let payload = RelabelRequest {
            title_from,
            tag_from,
            title_to,
            tag_to,
        };
        self.send_ack("POST", &["v0", "relabel"], &payload)
            .map_err(|err| err.with_bulletin(title_from, tag_from))
    }

    fn archive(&self, acv_name: &str, title: &str, tag: Option<&str>) -> ApiResult<()> {
        let payload = ArchiveRequest {
            acv_name,
            title,
            tag,
        };
        self.send_ack("POST", &["v0", "archive"], &payload)
            .map_err(|err| err.with_bulletin(title, tag))
    }

    fn load(&self, acv_name: &str) -> ApiResult<()> {
        self.send_ack("POST", &["v0", "load"], &ArchiveNameRequest { acv_name })
    }

    fn list_archive(&self) -> ApiResult<Vec<String>> {
        let envelope: ArchivesEnvelope = self.get_json(&["v0", "archives"])?;
        Ok(envelope.archives)
    }

    fn rename_archive(&self, name_from: &str, name_to: &str) -> ApiResult<()> {
        let payload = RenameArchiveRequest { name_from, name_to };
        self.send_ack("POST", &["v0", "rename_archive"], &payload)
    }

    fn delete_archive(&self, acv_name: &str) -> ApiResult<()> {
        self.send_ack("POST", &["v0", "delete_archive"], &ArchiveNameRequest { acv_name })
    }

    fn dump(&self, acv_name: &str) -> ApiResult<()> {
        self.send_ack("POST", &["v0", "dump"], &ArchiveNameRequest { acv_name })
    }

    fn restore(&self, acv_name: &str) -> ApiResult<()> {
        self.send_ack("POST", &["v0", "restore"], &ArchiveNameRequest { acv_name })
    }

    fn reset(&self) -> ApiResult<()> {
        self.send_ack("POST", &["v0", "reset"], &())
    }

    fn clear_log(&self) -> ApiResult<()> {
        self.send_ack("POST", &["v0", "clear_log"], &())
    }

    fn log(&self) -> ApiResult<String> {
        let envelope: LogEnvelope = self.get_json(&["v0", "log"])?;
        Ok(envelope.log)
    }

    fn server_version(&self) -> ApiResult<String> {
        let envelope: VersionEnvelope = self.get_json(&["v0", "version"])?;
        Ok(envelope.version)
    }

    fn terminate(&self) -> ApiResult<()> {
        self.send_ack("POST", &["v0", "terminate"], &())
    }
}

fn normalize_addr(raw: String) -> ApiResult<Url> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message("gateway address is empty"));
    }
    let candidate = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    let mut url = Url::parse(&candidate).map_err(|err| {
        Error::new(ErrorKind::Usage)
            .with_message(format!("invalid gateway address: {raw}"))
            .with_source(err)
    })?;
    let scheme = url.scheme();
    if scheme != "http" && scheme != "https" {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("gateway address must use http or https scheme"));
    }
    if url.path() != "/" && !url.path().is_empty() {
        return Err(Error::new(ErrorKind::Usage).with_message("gateway address must not include a path"));
    }
    url.set_path("/");
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

fn build_url(base_url: &Url, segments: &[&str]) -> ApiResult<Url> {
    let mut url = base_url.clone();
    {
        let mut path = url.path_segments_mut().map_err(|_| {
            Error::new(ErrorKind::Usage).with_message("gateway address cannot be a base")
        })?;
        path.clear();
        for segment in segments {
            path.push(segment);
        }
    }
    Ok(url)
}

fn read_json_response<R>(response: ureq::Response) -> ApiResult<R>
where
    R: DeserializeOwned,
{
    let body = response.into_string().map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read response body")
            .with_source(err)
    })?;
    serde_json::from_str(&body).map_err(|err| {
        Error::new(ErrorKind::Internal)
            .with_message("invalid response json")
            .with_source(err)
    })
}

fn parse_error_response(status: u16, response: ureq::Response) -> Error {
    let body = response.into_string().unwrap_or_default();
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(&body) {
        return error_from_remote(envelope.error);
    }
    let kind = error_kind_from_status(status);
    Error::new(kind).with_message(format!("board error status {status}"))
}

fn error_from_remote(remote: RemoteError) -> Error {
    let mut err = Error::new(parse_error_kind(&remote.kind));
    if let Some(message) = remote.message {
        err = err.with_message(message);
    }
    if let Some(hint) = remote.hint {
        err = err.with_hint(hint);
    }
    if let Some(title) = remote.title {
        err = err.with_bulletin(title, remote.tag.as_deref());
    }
    if let Some(revision) = remote.revision {
        err = err.with_revision(revision);
    }
    err
}

fn error_kind_from_status(status: u16) -> ErrorKind {
    match status {
        400 | 413 | 422 => ErrorKind::Usage,
        401 | 403 => ErrorKind::Permission,
        404 => ErrorKind::NotFound,
        409 => ErrorKind::NotUnique,
        500..=599 => ErrorKind::Internal,
        _ => ErrorKind::Io,
    }
}
