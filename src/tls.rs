use super::*;
use std::io::BufRead;
use tokio_tls_listener::{rustls::ServerConfig, tls_config, tokio_rustls::TlsAcceptor};

/// A validated TLS configuration used to terminate secure connections.
#[derive(Debug, Clone)]
pub struct TlsContext(Arc<ServerConfig>);

impl TlsContext {
    /// Loads a certificate chain and private key in PEM format, advertising `h2` over ALPN.
    pub fn from_pem(certs: &mut dyn BufRead, key: &mut dyn BufRead) -> std::io::Result<Self> {
        let mut conf = tls_config(key, certs).map_err(io_err)?;
        conf.alpn_protocols = vec![b"h2".to_vec()];
        if cfg!(debug_assertions) && std::env::var("SSLKEYLOGFILE").is_ok() {
            conf.key_log = Arc::new(tokio_tls_listener::rustls::KeyLogFile::new());
        }
        Ok(Self(Arc::new(conf)))
    }

    /// The underlying rustls configuration.
    pub fn config(&self) -> &Arc<ServerConfig> {
        &self.0
    }

    pub(crate) fn acceptor(&self) -> TlsAcceptor {
        TlsAcceptor::from(Arc::clone(&self.0))
    }
}

impl From<Arc<ServerConfig>> for TlsContext {
    fn from(config: Arc<ServerConfig>) -> Self {
        Self(config)
    }
}

impl From<ServerConfig> for TlsContext {
    fn from(config: ServerConfig) -> Self {
        Self(Arc::new(config))
    }
}

/// The `tls` argument of the construction gate.
#[derive(Debug, Clone)]
pub enum TlsArg {
    /// A TLS context.
    Context(TlsContext),
    /// Anything else the hosting runtime handed over.
    Foreign(HostValue),
}

impl TlsArg {
    pub(crate) fn validate(self) -> Result<TlsContext, ConfigError> {
        match self {
            TlsArg::Context(context) => Ok(context),
            TlsArg::Foreign(value) => Err(ConfigError::Tls(value)),
        }
    }
}

impl From<TlsContext> for TlsArg {
    fn from(context: TlsContext) -> Self {
        TlsArg::Context(context)
    }
}

impl From<Arc<ServerConfig>> for TlsArg {
    fn from(config: Arc<ServerConfig>) -> Self {
        TlsArg::Context(TlsContext(config))
    }
}

impl From<HostValue> for TlsArg {
    fn from(value: HostValue) -> Self {
        TlsArg::Foreign(value)
    }
}
