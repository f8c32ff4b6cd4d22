//! # Transport Module
//!
//! Datagram link to the flight controller's network bridge.
//!
//! This module handles:
//! - Binding the local UDP port and resolving the remote endpoint
//! - Sending command messages (fire-and-forget)
//! - Receiving raw telemetry datagrams from any sender
//!
//! The socket is left unconnected so telemetry is accepted even when the
//! firmware answers from a different address or port than commands go to.
//! There is no acknowledgment, retry or reordering: a lost datagram is lost.

pub mod datagram;

pub use datagram::DatagramIO;

use async_trait::async_trait;
use std::io;
use std::net::SocketAddr;
use tokio::net::{lookup_host, UdpSocket};
use tracing::{info, trace};

use crate::config::LinkConfig;
use crate::error::{BridgeError, Result};

/// UDP socket bound locally, sending to one remote endpoint
#[derive(Debug)]
pub struct UdpLink {
    socket: UdpSocket,
    remote: String,
    remote_addr: SocketAddr,
}

impl UdpLink {
    /// Bind `local_port` on all interfaces and resolve `remote`
    ///
    /// # Arguments
    ///
    /// * `local_port` - Port to listen on for telemetry (0 picks a free port)
    /// * `remote` - `host:port` of the flight controller bridge
    ///
    /// # Errors
    ///
    /// Returns `Transport` if the port is taken or the remote cannot be resolved
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use skynet_bridge::transport::UdpLink;
    ///
    /// #[tokio::main]
    /// async fn main() -> anyhow::Result<()> {
    ///     let link = UdpLink::connect(14551, "192.168.4.1:14550").await?;
    ///     println!("Linked to {}", link.remote());
    ///     Ok(())
    /// }
    /// ```
    pub async fn connect(local_port: u16, remote: &str) -> Result<Self> {
        let socket = UdpSocket::bind(("0.0.0.0", local_port))
            .await
            .map_err(|e| BridgeError::Transport(format!("Failed to bind port {}: {}", local_port, e)))?;

        let remote_addr = resolve(remote).await?;

        info!("UDP link {} -> {} ({})", local_port, remote, remote_addr);

        Ok(Self {
            socket,
            remote: remote.to_string(),
            remote_addr,
        })
    }

    /// Connect using the `[link]` section of the configuration
    pub async fn from_config(config: &LinkConfig) -> Result<Self> {
        Self::connect(config.local_port, &config.remote_addr()).await
    }

    /// Remote endpoint as configured
    pub fn remote(&self) -> &str {
        &self.remote
    }

    /// Resolved address commands are sent to
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    /// Local address actually bound
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }
}

#[async_trait]
impl DatagramIO for UdpLink {
    async fn send(&self, data: &[u8]) -> io::Result<usize> {
        self.socket.send_to(data, self.remote_addr).await
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let (n, from) = self.socket.recv_from(buf).await?;
        if from != self.remote_addr {
            trace!("{} bytes from {}", n, from);
        }
        Ok(n)
    }
}

/// First IPv4 address for `remote`, else the first address of any family
async fn resolve(remote: &str) -> Result<SocketAddr> {
    let addrs: Vec<SocketAddr> = lookup_host(remote)
        .await
        .map_err(|e| BridgeError::Transport(format!("Failed to resolve {}: {}", remote, e)))?
        .collect();

    addrs
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| BridgeError::Transport(format!("No address found for {}", remote)))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn peer() -> (UdpSocket, SocketAddr) {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap();
        (socket, addr)
    }

    #[tokio::test]
    async fn test_send_reaches_remote() {
        let (peer, peer_addr) = peer().await;
        let link = UdpLink::connect(0, &peer_addr.to_string()).await.unwrap();

        let sent = tokio_test::assert_ok!(link.send(b"{\"command\":\"arm\"}").await);
        assert_eq!(sent, 17);

        let mut buf = [0u8; 64];
        let (n, _) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"{\"command\":\"arm\"}");
    }

    #[tokio::test]
    async fn test_recv_from_remote() {
        let (peer, peer_addr) = peer().await;
        let link = UdpLink::connect(0, &peer_addr.to_string()).await.unwrap();
        let port = link.local_addr().unwrap().port();

        peer.send_to(&[0x24, 0x4D, 0x3E], ("127.0.0.1", port)).await.unwrap();

        let mut buf = [0u8; 16];
        let n = tokio_test::assert_ok!(link.recv(&mut buf).await);
        assert_eq!(&buf[..n], &[0x24, 0x4D, 0x3E]);
    }

    #[tokio::test]
    async fn test_recv_from_other_sender() {
        let (_peer, peer_addr) = peer().await;
        let (stranger, _) = peer().await;
        let link = UdpLink::connect(0, &peer_addr.to_string()).await.unwrap();
        let port = link.local_addr().unwrap().port();

        // Firmware answering from a port other than the command port
        stranger.send_to(&[0x24, 0x4D, 0x3E, 0x00], ("127.0.0.1", port)).await.unwrap();

        let mut buf = [0u8; 16];
        let n = tokio_test::assert_ok!(link.recv(&mut buf).await);
        assert_eq!(&buf[..n], &[0x24, 0x4D, 0x3E, 0x00]);
    }

    #[tokio::test]
    async fn test_remote_addr_resolved() {
        let (_peer, peer_addr) = peer().await;
        let link = UdpLink::connect(0, &format!("localhost:{}", peer_addr.port())).await.unwrap();
        assert_eq!(link.remote_addr().port(), peer_addr.port());
        assert!(link.remote_addr().ip().is_loopback());
    }

    #[tokio::test]
    async fn test_connect_unresolvable_remote() {
        let result = UdpLink::connect(0, "not a host").await;
        match result {
            Err(BridgeError::Transport(msg)) => assert!(msg.contains("not a host")),
            other => panic!("Expected Transport error, got: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remote_is_kept() {
        let (_peer, peer_addr) = peer().await;
        let link = UdpLink::connect(0, &peer_addr.to_string()).await.unwrap();
        assert_eq!(link.remote(), peer_addr.to_string());
    }

    #[tokio::test]
    async fn test_from_config() {
        let (_peer, peer_addr) = peer().await;
        let config = LinkConfig {
            remote_host: "127.0.0.1".to_string(),
            remote_port: peer_addr.port(),
            local_port: 0,
            ..LinkConfig::default()
        };
        let link = UdpLink::from_config(&config).await.unwrap();
        assert_eq!(link.remote(), format!("127.0.0.1:{}", peer_addr.port()));
    }
}
