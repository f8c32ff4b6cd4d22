//! Trait abstraction for datagram I/O to enable testing

use async_trait::async_trait;
use std::io;

/// Datagram endpoint with one fixed destination
///
/// One call is one datagram. Both methods take `&self` so a single link can
/// be sent on while a receive is pending.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatagramIO: Send + Sync {
    /// Send one datagram to the destination
    async fn send(&self, data: &[u8]) -> io::Result<usize>;

    /// Receive one datagram from any sender into `buf`
    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize>;
}
