//! Multicast UDP socket for the incremental and snapshot feeds. Both BIN
//! and TXT multicast feeds read the same way: join a group, read
//! datagrams, hand the bytes to the codec.

use std::net::{Ipv4Addr, SocketAddr};

use tokio::net::UdpSocket;

use crate::error::{NetworkError, Result};

pub struct MulticastSocket {
    socket: UdpSocket,
}

impl MulticastSocket {
    /// Binds to `bind_addr` and joins `group` on `interface`. Typical use
    /// is one of these per A/B redundant feed (§4.6: "the core never
    /// arbitrates between A and B -- it consumes whichever feed the
    /// caller wires it to").
    pub async fn join(bind_addr: SocketAddr, group: Ipv4Addr, interface: Ipv4Addr) -> Result<Self> {
        let socket = UdpSocket::bind(bind_addr)
            .await
            .map_err(NetworkError::Io)?;
        socket
            .join_multicast_v4(group, interface)
            .map_err(NetworkError::Io)?;
        Ok(Self { socket })
    }

    pub async fn recv(&self, buf: &mut [u8]) -> Result<usize> {
        self.socket.recv(buf).await.map_err(NetworkError::Io)
    }
}
