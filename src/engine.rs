use super::*;
use socket2::{Socket, Type};
use std::os::fd::{AsRawFd, OwnedFd};

/// The native server engine the construction gate delegates to.
///
/// The gate guarantees that every descriptor it hands over is non-blocking
/// (or was bare to begin with) and no longer owned by anything else.
pub trait Engine {
    /// What the engine passes to the callback for every request.
    type Request: Send + 'static;

    /// The running server.
    type Server;

    /// Builds a server listening on `sockets`, in order.
    fn construct(
        &self,
        sockets: Vec<OwnedFd>,
        callback: Callback<Self::Request>,
        native: &NativeLoop,
        tls: Option<TlsContext>,
        backlog: i32,
    ) -> Result<Self::Server, ConstructionError>;
}

/// Settings of the default HTTP/2 engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// `SETTINGS_MAX_CONCURRENT_STREAMS` advertised to clients.
    pub max_concurrent_streams: Option<u32>,
    /// Initial stream-level flow-control window.
    pub initial_window_size: Option<u32>,
    /// Largest frame payload the server accepts.
    pub max_frame_size: Option<u32>,
    /// Requests with a larger body are answered `413` without reaching the callback.
    pub max_payload_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_concurrent_streams: None,
            initial_window_size: None,
            max_frame_size: None,
            max_payload_size: 16 * 1024 * 1024,
        }
    }
}

impl EngineConfig {
    pub(crate) fn builder(&self) -> h2::server::Builder {
        let mut builder = h2::server::Builder::new();
        if let Some(max) = self.max_concurrent_streams {
            builder.max_concurrent_streams(max);
        }
        if let Some(size) = self.initial_window_size {
            builder.initial_window_size(size);
        }
        if let Some(size) = self.max_frame_size {
            builder.max_frame_size(size);
        }
        builder
    }
}

/// The default engine: HTTP/2 over tokio, with optional rustls termination.
#[derive(Debug, Clone, Default)]
pub struct H2Engine {
    config: EngineConfig,
}

impl H2Engine {
    /// An engine with custom settings.
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl Engine for H2Engine {
    type Request = Request;
    type Server = Server;

    fn construct(
        &self,
        sockets: Vec<OwnedFd>,
        callback: Callback<Request>,
        native: &NativeLoop,
        tls: Option<TlsContext>,
        backlog: i32,
    ) -> Result<Server, ConstructionError> {
        let sockets: Vec<Socket> = sockets.into_iter().map(Socket::from).collect();
        if backlog < 0 {
            return Err(ConstructionError::Backlog(backlog));
        }
        for socket in &sockets {
            if !matches!(socket.r#type(), Ok(ty) if ty == Type::STREAM) {
                return Err(ConstructionError::Descriptor(socket.as_raw_fd()));
            }
        }

        let _runtime = native.handle().enter();
        let mut listeners = Vec::with_capacity(sockets.len());
        for socket in sockets {
            let fd = socket.as_raw_fd();
            socket
                .set_nonblocking(true)
                .map_err(|source| ConstructionError::Reopen { fd, source })?;
            socket
                .listen(backlog)
                .map_err(|source| ConstructionError::Listen { fd, source })?;
            let listener = tokio::net::TcpListener::from_std(socket.into())
                .map_err(|source| ConstructionError::Reopen { fd, source })?;
            listeners.push(listener);
        }
        Ok(Server::start(
            listeners,
            callback,
            native,
            tls,
            self.config.clone(),
        ))
    }
}
