// ABOUTME: Minimal unframed UDP datagram endpoint, ambient alongside the framing layer
// ABOUTME: Framing is defined over reliable byte streams only; UDP never goes through FramedDecoder

use std::net::SocketAddr;

use tokio::net::{ToSocketAddrs, UdpSocket};

use crate::error::Result;

/// A bound UDP socket for datagram send/receive.
///
/// Deliberately has no relationship to [`crate::decoder::FramedDecoder`]:
/// The framing layer is scoped to "a reliable byte stream", and UDP
/// datagrams are already message-granular, so there is nothing for a
/// size-prefix codec to reassemble.
pub struct UdpEndpoint {
    socket: UdpSocket,
}

impl UdpEndpoint {
    /// Bind a UDP socket to `addr`.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        let socket = UdpSocket::bind(addr).await?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Send one datagram to `target`.
    pub async fn send_to(&self, payload: &[u8], target: impl ToSocketAddrs) -> Result<usize> {
        let mut addrs = tokio::net::lookup_host(target).await?;
        let target = addrs
            .next()
            .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "no address resolved"))?;
        Ok(self.socket.send_to(payload, target).await?)
    }

    /// Receive one datagram into `buf`, returning its length and sender address.
    pub async fn recv_from(&self, buf: &mut [u8]) -> Result<(usize, SocketAddr)> {
        Ok(self.socket.recv_from(buf).await?)
    }
}
