use super::*;
use crate::shutdown::ShutDownState;
use h2::server::SendResponse;
use http::{HeaderMap, HeaderName, HeaderValue, StatusCode};

/// Builds a response head from user-supplied parts.
pub(crate) fn response_head<'a>(
    status: u16,
    headers: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> Result<http::Response<()>, RespondError> {
    let status = StatusCode::from_u16(status).map_err(|_| RespondError::InvalidStatus(status))?;
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| RespondError::InvalidHeaderName(name.to_owned()))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| RespondError::InvalidHeaderValue(name.as_str().to_owned()))?;
        map.append(name, value);
    }
    let mut response = http::Response::new(());
    *response.status_mut() = status;
    *response.headers_mut() = map;
    Ok(response)
}

/// Sending half of a stream. Sends exactly one response.
///
/// Dropping it before anything was sent answers `500 Internal Server Error`,
/// unless the server was closed in the meantime.
#[derive(Debug)]
pub(crate) struct Responder {
    sender: Option<SendResponse<Bytes>>,
    closed: ShutDownState,
}

impl Responder {
    pub fn new(sender: SendResponse<Bytes>, closed: ShutDownState) -> Self {
        Self {
            sender: Some(sender),
            closed,
        }
    }

    pub fn is_started(&self) -> bool {
        self.sender.is_none()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.is_shutdown()
    }

    pub fn stream_id(&self) -> Option<h2::StreamId> {
        self.sender.as_ref().map(SendResponse::stream_id)
    }

    /// Sends the head and the whole body at once.
    ///
    /// Data is queued without waiting for flow-control capacity; the connection
    /// flushes it as the peer opens its window.
    pub fn send(&mut self, response: http::Response<()>, data: Bytes) -> Result<(), RespondError> {
        let mut sender = self.sender.take().ok_or(RespondError::AlreadyResponded)?;
        let end = data.is_empty();
        let mut stream = sender.send_response(response, end)?;
        if !end {
            stream.send_data(data, true)?;
        }
        Ok(())
    }
}

impl Drop for Responder {
    fn drop(&mut self) {
        if self.is_started() || self.is_closed() {
            return;
        }
        let mut response = http::Response::new(());
        *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
        let _ = self.send(response, Bytes::from_static(b"No response"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_head() {
        let head = response_head(
            201,
            [("content-type", "text/plain"), ("x-a", "1"), ("x-a", "2")],
        )
        .unwrap();
        assert_eq!(head.status(), StatusCode::CREATED);
        assert_eq!(head.headers().get_all("x-a").iter().count(), 2);
    }

    #[test]
    fn rejects_bad_parts() {
        assert!(matches!(response_head(1000, []), Err(RespondError::InvalidStatus(1000))));
        assert!(matches!(
            response_head(200, [("bad header", "x")]),
            Err(RespondError::InvalidHeaderName(name)) if name == "bad header"
        ));
        assert!(matches!(
            response_head(200, [("x-a", "line\nbreak")]),
            Err(RespondError::InvalidHeaderValue(name)) if name == "x-a"
        ));
    }
}
