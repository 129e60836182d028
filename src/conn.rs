use super::*;
use h2::{server::SendResponse, RecvStream};
use tokio::io::{AsyncRead, AsyncWrite};

/// Represents an accepted HTTP/2 connection.
pub(crate) struct Conn<IO>(h2::server::Connection<IO, Bytes>);

impl<IO> Conn<IO>
where
    IO: Unpin + AsyncRead + AsyncWrite,
{
    pub async fn handshake(builder: &h2::server::Builder, io: IO) -> Result<Conn<IO>> {
        builder.handshake(io).await.map(Self)
    }

    /// Accepts the next stream, driving the connection meanwhile.
    pub async fn accept(
        &mut self,
    ) -> Option<Result<(http::Request<RecvStream>, SendResponse<Bytes>)>> {
        poll_fn(|cx| self.0.poll_accept(cx)).await
    }

    pub fn graceful_shutdown(&mut self) {
        self.0.graceful_shutdown();
    }
}
