use super::*;
use crate::{
    conn::Conn,
    request::{read_payload, PayloadError},
    response::Responder,
    shutdown::ShutDownState,
};
use h2::{server::SendResponse, RecvStream};
use std::net::SocketAddr;
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{TcpListener, TcpStream},
};
use tokio_tls_listener::tokio_rustls::TlsAcceptor;
use tracing::{debug, info, trace, warn};

struct Shared {
    callback: Callback<Request>,
    tls: Option<TlsAcceptor>,
    config: EngineConfig,
    closed: ShutDownState,
}

/// The [Server] represents a running HTTP/2 server built by [H2Engine].
///
/// Listeners are served on the native loop until [Server::close] is called or
/// the server is dropped.
pub struct Server {
    callback: Callback<Request>,
    local_addrs: Vec<SocketAddr>,
    closed: ShutDownState,
}

impl Server {
    /// Validates the arguments and builds a server with the default [H2Engine].
    ///
    /// See [construct] for the validation rules.
    pub fn new(
        sockets: impl IntoIterator<Item = SocketArg>,
        callback: CallbackArg<Request>,
        options: Options,
    ) -> Result<Self, Error> {
        construct(&H2Engine::default(), sockets, callback, options)
    }

    pub(crate) fn start(
        listeners: Vec<TcpListener>,
        callback: Callback<Request>,
        native: &NativeLoop,
        tls: Option<TlsContext>,
        config: EngineConfig,
    ) -> Self {
        let closed = ShutDownState::new();
        let local_addrs = listeners
            .iter()
            .filter_map(|listener| listener.local_addr().ok())
            .collect();
        let shared = Arc::new(Shared {
            callback: Arc::clone(&callback),
            tls: tls.as_ref().map(TlsContext::acceptor),
            config,
            closed: closed.clone(),
        });
        for listener in listeners {
            native
                .handle()
                .spawn(accept_loop(listener, Arc::clone(&shared)));
        }
        Self {
            callback,
            local_addrs,
            closed,
        }
    }

    /// Stops accepting connections and asks open ones to shut down gracefully.
    ///
    /// Requests that have not been answered yet can no longer be answered.
    pub fn close(&self) {
        if self.closed.shutdown() {
            info!(listeners = self.local_addrs.len(), "server closed");
        }
    }

    /// Whether [Server::close] was called.
    pub fn is_closed(&self) -> bool {
        self.closed.is_shutdown()
    }

    /// Addresses of the listening sockets, in the order they were given.
    pub fn local_addrs(&self) -> &[SocketAddr] {
        &self.local_addrs
    }

    /// The callback invoked for every request.
    pub fn callback(&self) -> &Callback<Request> {
        &self.callback
    }
}

impl Drop for Server {
    fn drop(&mut self) {
        self.close();
    }
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("local_addrs", &self.local_addrs)
            .field("closed", &self.is_closed())
            .finish_non_exhaustive()
    }
}

async fn accept_loop(listener: TcpListener, shared: Arc<Shared>) {
    let mut closed = shared.closed.clone();
    loop {
        let (stream, addr) = tokio::select! {
            _ = closed.wait() => break,
            accepted = listener.accept() => match accepted {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!(%err, "accept failed");
                    continue;
                }
            },
        };
        trace!(%addr, "connection accepted");
        tokio::spawn(serve(stream, addr, Arc::clone(&shared)));
    }
    debug!(addr = ?listener.local_addr().ok(), "listener closed");
}

async fn serve(stream: TcpStream, addr: SocketAddr, shared: Arc<Shared>) {
    match shared.tls.clone() {
        Some(acceptor) => match acceptor.accept(stream).await {
            Ok(stream) => serve_conn(stream, addr, shared).await,
            Err(err) => debug!(%addr, %err, "tls handshake failed"),
        },
        None => serve_conn(stream, addr, shared).await,
    }
}

async fn serve_conn<IO>(io: IO, addr: SocketAddr, shared: Arc<Shared>)
where
    IO: Unpin + AsyncRead + AsyncWrite,
{
    let mut conn = match Conn::handshake(&shared.config.builder(), io).await {
        Ok(conn) => conn,
        Err(err) => {
            debug!(%addr, %err, "http/2 handshake failed");
            return;
        }
    };
    let mut closed = shared.closed.clone();
    let mut draining = false;
    loop {
        tokio::select! {
            accepted = conn.accept() => match accepted {
                Some(Ok((req, sender))) => {
                    tokio::spawn(dispatch(req, sender, Arc::clone(&shared)));
                }
                Some(Err(err)) => {
                    debug!(%addr, %err, "connection error");
                    break;
                }
                None => break,
            },
            _ = closed.wait(), if !draining => {
                draining = true;
                conn.graceful_shutdown();
            }
        }
    }
    trace!(%addr, "connection closed");
}

/// Reads the payload, then hands the request to the callback on this task.
async fn dispatch(req: http::Request<RecvStream>, sender: SendResponse<Bytes>, shared: Arc<Shared>) {
    let (head, mut body) = req.into_parts();
    let mut responder = Responder::new(sender, shared.closed.clone());
    let payload = match read_payload(&mut body, shared.config.max_payload_size).await {
        Ok(payload) => payload,
        Err(PayloadError::TooLarge(limit)) => {
            debug!(limit, "request payload too large");
            let mut response = http::Response::new(());
            *response.status_mut() = http::StatusCode::PAYLOAD_TOO_LARGE;
            let _ = responder.send(response, Bytes::new());
            return;
        }
        Err(PayloadError::Stream(err)) => {
            debug!(%err, "failed to read request payload");
            return;
        }
    };
    let request = Request::new(head, payload, responder);
    (shared.callback)(request);
}
