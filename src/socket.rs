use super::*;
use std::{net::TcpListener, os::fd::OwnedFd};

/// A listening socket handed to the construction gate.
#[derive(Debug)]
pub enum SocketArg {
    /// A bare descriptor. Ownership moves to the engine; the gate does not touch it.
    Raw(OwnedFd),
    /// A standard library listener, detached by the gate.
    Listener(TcpListener),
    /// A `socket2` socket, detached by the gate.
    Socket(socket2::Socket),
}

impl From<OwnedFd> for SocketArg {
    fn from(fd: OwnedFd) -> Self {
        SocketArg::Raw(fd)
    }
}

impl From<TcpListener> for SocketArg {
    fn from(listener: TcpListener) -> Self {
        SocketArg::Listener(listener)
    }
}

impl From<socket2::Socket> for SocketArg {
    fn from(socket: socket2::Socket) -> Self {
        SocketArg::Socket(socket)
    }
}

fn detach(listener: TcpListener, index: usize) -> Result<OwnedFd, Error> {
    listener
        .set_nonblocking(true)
        .map_err(|source| Error::Detach { index, source })?;
    Ok(OwnedFd::from(listener))
}

/// Turns every socket into a bare descriptor, keeping the input order.
///
/// Socket objects are switched to non-blocking mode and give up ownership of
/// their descriptor. If that fails half-way, every socket is consumed and the
/// descriptors collected so far are closed.
pub(crate) fn normalize(sockets: Vec<SocketArg>) -> Result<Vec<OwnedFd>, Error> {
    let mut descriptors = Vec::with_capacity(sockets.len());
    for (index, socket) in sockets.into_iter().enumerate() {
        let descriptor = match socket {
            SocketArg::Raw(fd) => fd,
            SocketArg::Listener(listener) => detach(listener, index)?,
            SocketArg::Socket(socket) => detach(socket.into(), index)?,
        };
        descriptors.push(descriptor);
    }
    Ok(descriptors)
}
