use async_trait::async_trait;

use crate::error::*;

/// Transport is the capability a `Client`/`Server` is handed to exchange
/// raw datagrams with a peer. It stands in for the teacher's much larger
/// `util::Conn`, carrying only the send/recv surface STUN transactions need.
///
/// A connected transport (e.g. a UDP socket already associated with the
/// server's address) implements `send`/`recv` against that peer; a server
/// socket that must track distinct clients would instead wrap
/// `tokio::net::UdpSocket::send_to`/`recv_from` and keep the peer address
/// alongside the datagram.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, buf: &[u8]) -> Result<()>;
    async fn recv(&self, buf: &mut [u8]) -> Result<usize>;
}

#[async_trait]
impl Transport for tokio::net::UdpSocket {
    async fn send(&self, buf: &[u8]) -> Result<()> {
        self.send(buf).await?;
        Ok(())
    }

    async fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        Ok(self.recv(buf).await?)
    }
}
