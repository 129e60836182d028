//! Shared helpers for integration tests.
#![allow(dead_code)]

use bytes::{Bytes, BytesMut};
use h2bridge::tokio_tls_listener::{
    load,
    rustls::{ClientConfig, RootCertStore, ServerName},
    tokio_rustls::TlsConnector,
};
use h2bridge::{BoxFuture, Callback, ConstructionError, Engine, NativeLoop, Spawn, TlsContext};
use http::StatusCode;
use std::{
    net::SocketAddr,
    os::fd::{IntoRawFd, OwnedFd, RawFd},
    sync::{Arc, Mutex},
};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::TcpStream,
};

/// Everything the gate handed to [RecordingEngine].
pub struct Built {
    pub sockets: Vec<RawFd>,
    pub callback: Callback<String>,
    pub tls: bool,
    pub backlog: i32,
}

impl std::fmt::Debug for Built {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Built")
            .field("sockets", &self.sockets)
            .field("tls", &self.tls)
            .field("backlog", &self.backlog)
            .finish_non_exhaustive()
    }
}

/// Engine that records its construction arguments instead of serving.
///
/// It releases the descriptors without closing them, so tests can take them back.
pub struct RecordingEngine;

impl Engine for RecordingEngine {
    type Request = String;
    type Server = Built;

    fn construct(
        &self,
        sockets: Vec<OwnedFd>,
        callback: Callback<String>,
        _native: &NativeLoop,
        tls: Option<TlsContext>,
        backlog: i32,
    ) -> Result<Built, ConstructionError> {
        Ok(Built {
            sockets: sockets.into_iter().map(IntoRawFd::into_raw_fd).collect(),
            callback,
            tls: tls.is_some(),
            backlog,
        })
    }
}

/// Engine that always fails.
pub struct FailingEngine;

impl Engine for FailingEngine {
    type Request = String;
    type Server = ();

    fn construct(
        &self,
        _: Vec<OwnedFd>,
        _: Callback<String>,
        _: &NativeLoop,
        _: Option<TlsContext>,
        backlog: i32,
    ) -> Result<(), ConstructionError> {
        Err(ConstructionError::Backlog(backlog))
    }
}

/// Spawner that keeps tasks instead of running them.
#[derive(Clone, Default)]
pub struct RecordingSpawner {
    tasks: Arc<Mutex<Vec<BoxFuture>>>,
}

impl RecordingSpawner {
    pub fn len(&self) -> usize {
        self.tasks.lock().unwrap().len()
    }

    pub fn take(&self) -> Vec<BoxFuture> {
        std::mem::take(&mut *self.tasks.lock().unwrap())
    }
}

impl Spawn for RecordingSpawner {
    fn spawn(&self, task: BoxFuture) {
        self.tasks.lock().unwrap().push(task);
    }
}

/// Sends one request over a fresh h2c connection and collects the response.
pub async fn send(
    addr: SocketAddr,
    method: &str,
    path: &str,
    body: Option<&'static str>,
) -> (StatusCode, Bytes) {
    let tcp = TcpStream::connect(addr).await.unwrap();
    exchange(tcp, &format!("http://{addr}{path}"), method, body).await
}

/// Like [send], over TLS. The server certificate must be issued for `localhost`
/// by the PEM encoded `ca`, and the server has to pick `h2` through ALPN.
pub async fn send_tls(addr: SocketAddr, ca: &[u8], path: &str) -> (StatusCode, Bytes) {
    let mut roots = RootCertStore::empty();
    for cert in load::certs(&mut &*ca).unwrap() {
        roots.add(&cert).unwrap();
    }
    let mut config = ClientConfig::builder()
        .with_safe_defaults()
        .with_root_certificates(roots)
        .with_no_client_auth();
    config.alpn_protocols = vec![b"h2".to_vec()];

    let tcp = TcpStream::connect(addr).await.unwrap();
    let domain = ServerName::try_from("localhost").unwrap();
    let tls = TlsConnector::from(Arc::new(config))
        .connect(domain, tcp)
        .await
        .unwrap();
    assert_eq!(tls.get_ref().1.alpn_protocol(), Some(&b"h2"[..]));
    exchange(tls, &format!("https://localhost{path}"), "GET", None).await
}

async fn exchange<IO>(
    io: IO,
    uri: &str,
    method: &str,
    body: Option<&'static str>,
) -> (StatusCode, Bytes)
where
    IO: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let (client, connection) = h2::client::handshake(io).await.unwrap();
    tokio::spawn(async move {
        let _ = connection.await;
    });

    let mut client = client.ready().await.unwrap();
    let request = http::Request::builder()
        .method(method)
        .uri(uri)
        .body(())
        .unwrap();
    let (response, mut stream) = client.send_request(request, body.is_none()).unwrap();
    if let Some(body) = body {
        stream.send_data(Bytes::from_static(body.as_bytes()), true).unwrap();
    }

    let response = response.await.unwrap();
    let status = response.status();
    let mut body = response.into_body();
    let mut data = BytesMut::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.unwrap();
        body.flow_control().release_capacity(chunk.len()).unwrap();
        data.extend_from_slice(&chunk);
    }
    (status, data.freeze())
}
