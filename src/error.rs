use super::*;
use std::io;
use thiserror::Error;

/// A caller-side configuration mistake, detected before any socket is touched.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The `event_loop` argument is not a native event loop.
    #[error("event_loop: {0} is not a native event loop")]
    Loop(HostValue),

    /// The `callback` argument cannot be invoked.
    #[error("callback: {0} is not callable")]
    NotCallable(HostValue),

    /// An asynchronous callback was given together with a bare native loop.
    #[error("callback: got an asynchronous callback, but event_loop is not a cooperative scheduler")]
    MissingScheduler,

    /// The `tls` argument is not a TLS context.
    #[error("tls: {0} is not a TLS context")]
    Tls(HostValue),
}

/// A failure reported by the engine while building the server.
#[derive(Debug, Error)]
pub enum ConstructionError {
    /// The descriptor does not refer to a stream socket.
    #[error("fd {0} is not a stream socket")]
    Descriptor(RawFd),

    /// The backlog is out of range.
    #[error("invalid backlog {0}")]
    Backlog(i32),

    /// The descriptor could not be registered with the event loop.
    #[error("could not reopen fd {fd}: {source}")]
    Reopen {
        /// Offending descriptor.
        fd: RawFd,
        /// Underlying OS error.
        source: io::Error,
    },

    /// The descriptor could not be put into listening state.
    #[error("could not listen on {fd}: {source}")]
    Listen {
        /// Offending descriptor.
        fd: RawFd,
        /// Underlying OS error.
        source: io::Error,
    },
}

/// Errors returned by [construct] and [Server::new].
#[derive(Debug, Error)]
pub enum Error {
    /// Validation failed; the sockets are handed back unchanged.
    #[error("{error}")]
    Config {
        /// What was wrong with the arguments.
        error: ConfigError,
        /// The sockets passed to the call, in their original order.
        sockets: Vec<SocketArg>,
    },

    /// The socket at `index` could not be switched to non-blocking mode.
    #[error("sockets[{index}]: could not detach socket: {source}")]
    Detach {
        /// Position of the socket in the input sequence.
        index: usize,
        /// Underlying OS error.
        source: io::Error,
    },

    /// The engine failed to construct the server.
    #[error(transparent)]
    Construction(#[from] ConstructionError),
}

impl Error {
    /// Returns the configuration error, if that is what this is.
    pub fn config_error(&self) -> Option<&ConfigError> {
        match self {
            Error::Config { error, .. } => Some(error),
            _ => None,
        }
    }

    /// Recovers the sockets of a rejected configuration.
    ///
    /// Other errors happen after the sockets were consumed, so nothing is returned.
    pub fn into_sockets(self) -> Vec<SocketArg> {
        match self {
            Error::Config { sockets, .. } => sockets,
            _ => Vec::new(),
        }
    }
}

/// Errors returned by [Request::respond].
#[derive(Debug, Error)]
pub enum RespondError {
    /// A response has already been sent for this request.
    #[error("called `respond` twice")]
    AlreadyResponded,

    /// The server was closed before the response was sent.
    #[error("server already closed")]
    ServerClosed,

    /// Not a valid HTTP status code.
    #[error("invalid status code {0}")]
    InvalidStatus(u16),

    /// The header name is not a valid HTTP header name.
    #[error("unsupported header {0}")]
    InvalidHeaderName(String),

    /// The header value contains forbidden bytes.
    #[error("invalid value for header {0}")]
    InvalidHeaderValue(String),

    /// The underlying HTTP/2 stream failed.
    #[error(transparent)]
    Stream(#[from] h2::Error),
}
