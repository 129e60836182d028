use super::*;
use crate::response::{response_head, Responder};
use bytes::BytesMut;
use http::{header, HeaderMap, Version};

/// Represents an HTTP request handed to the callback, together with the means
/// to answer it.
pub struct Request {
    head: http::request::Parts,
    payload: Option<Bytes>,
    responder: Responder,
}

impl Request {
    pub(crate) fn new(
        head: http::request::Parts,
        payload: Option<Bytes>,
        responder: Responder,
    ) -> Self {
        Self {
            head,
            payload,
            responder,
        }
    }

    /// The request method, e.g. `GET`.
    pub fn method(&self) -> &str {
        self.head.method.as_str()
    }

    /// The path, including the query string.
    pub fn path(&self) -> &str {
        self.head
            .uri
            .path_and_query()
            .map_or("/", |path| path.as_str())
    }

    /// The `:authority` pseudo-header, or the `host` header.
    pub fn host(&self) -> Option<&str> {
        match self.head.uri.authority() {
            Some(authority) => Some(authority.as_str()),
            None => self.header(header::HOST),
        }
    }

    /// The protocol the client asked to upgrade to, if any.
    pub fn upgrade(&self) -> Option<&str> {
        self.header(header::UPGRADE)
    }

    /// Protocol version as `(major, minor)`.
    pub fn version(&self) -> (u8, u8) {
        let version = self.head.version;
        if version == Version::HTTP_09 {
            (0, 9)
        } else if version == Version::HTTP_10 {
            (1, 0)
        } else if version == Version::HTTP_11 {
            (1, 1)
        } else if version == Version::HTTP_3 {
            (3, 0)
        } else {
            (2, 0)
        }
    }

    /// The request body. `None` if the request carried no body at all.
    pub fn payload(&self) -> Option<&Bytes> {
        self.payload.as_ref()
    }

    /// Header `(name, value)` pairs in the order they were received.
    ///
    /// Values that are not valid UTF-8 are converted lossily.
    pub fn headers(&self) -> Vec<(String, String)> {
        self.head
            .headers
            .iter()
            .map(|(name, value)| {
                let value = String::from_utf8_lossy(value.as_bytes()).into_owned();
                (name.as_str().to_owned(), value)
            })
            .collect()
    }

    /// The raw header map.
    pub fn header_map(&self) -> &HeaderMap {
        &self.head.headers
    }

    /// Returns the stream ID of this request, until it has been answered.
    pub fn stream_id(&self) -> Option<h2::StreamId> {
        self.responder.stream_id()
    }

    /// Whether [Request::respond] has already succeeded.
    pub fn is_responded(&self) -> bool {
        self.responder.is_started()
    }

    /// Sends the response: status, headers and the complete body.
    ///
    /// Can only be done once per request, and not after the server was closed.
    /// A request dropped without a response is answered with
    /// `500 Internal Server Error` while the server is still open.
    pub fn respond<'a>(
        &mut self,
        status: u16,
        headers: impl IntoIterator<Item = (&'a str, &'a str)>,
        data: impl Into<Bytes>,
    ) -> Result<(), RespondError> {
        if self.responder.is_started() {
            return Err(RespondError::AlreadyResponded);
        }
        if self.responder.is_closed() {
            return Err(RespondError::ServerClosed);
        }
        let head = response_head(status, headers)?;
        self.responder.send(head, data.into())
    }

    fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.head
            .headers
            .get(name)
            .and_then(|value| value.to_str().ok())
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Request")?;
        self.head.fmt(f)
    }
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum PayloadError {
    #[error("payload exceeds {0} bytes")]
    TooLarge(usize),
    #[error(transparent)]
    Stream(#[from] h2::Error),
}

/// Reads the whole request body, releasing flow-control capacity as data arrives.
pub(crate) async fn read_payload(
    body: &mut h2::RecvStream,
    limit: usize,
) -> Result<Option<Bytes>, PayloadError> {
    if body.is_end_stream() {
        return Ok(None);
    }
    let mut payload = BytesMut::new();
    while let Some(data) = body.data().await {
        let data = data?;
        body.flow_control().release_capacity(data.len())?;
        if payload.len() + data.len() > limit {
            return Err(PayloadError::TooLarge(limit));
        }
        payload.extend_from_slice(&data);
    }
    Ok(Some(payload.freeze()))
}
