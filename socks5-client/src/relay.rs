use crate::error::RelayError;
use bytes::BytesMut;
use log::{debug, trace};
use socks5_proto::{Address, UdpHeader};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use tokio::net::{TcpListener, UdpSocket};

/// Best-effort ephemeral port reservation.
///
/// Binds a throwaway listener on port 0, reads back the assigned port and
/// releases the listener. Another process can claim the port before the
/// relay socket rebinds it; that window surfaces as [`RelayError::Open`].
pub(crate) async fn reserve_ephemeral_port() -> Result<u16, RelayError> {
    let listener = TcpListener::bind((Ipv4Addr::UNSPECIFIED, 0))
        .await
        .map_err(RelayError::PortReservation)?;

    let port = listener
        .local_addr()
        .map_err(RelayError::PortReservation)?
        .port();

    drop(listener);
    Ok(port)
}

/// An active UDP relay through the proxy.
///
/// Exists only once the proxy has answered ASSOCIATE with a succeeded
/// reply; the socket is bound to the reserved local port and connected to
/// the relay endpoint, so plain `send`/`recv` reach the proxy.
#[derive(Debug)]
pub struct UdpAssociation {
    socket: UdpSocket,
    local_port: u16,
    relay_addr: SocketAddr,
}

impl UdpAssociation {
    /// Opens the relay socket against the bound address the proxy returned.
    ///
    /// A bound address with an unspecified IP means "same host as the
    /// proxy itself".
    pub(crate) async fn open(
        local_port: u16,
        bound: Address,
        proxy_ip: IpAddr,
    ) -> Result<Self, RelayError> {
        let mut relay_addr = match bound.to_socket_addr() {
            Ok(addr) => addr,
            Err(_) => return Err(RelayError::Endpoint(bound)),
        };

        if relay_addr.ip().is_unspecified() {
            relay_addr.set_ip(proxy_ip);
        }

        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, local_port))
            .await
            .map_err(RelayError::Open)?;
        socket.connect(relay_addr).await.map_err(RelayError::Open)?;

        debug!("UDP relay open: local port {local_port}, endpoint {relay_addr}");

        Ok(Self {
            socket,
            local_port,
            relay_addr,
        })
    }

    /// The endpoint the proxy relays datagrams through.
    pub fn relay_addr(&self) -> SocketAddr {
        self.relay_addr
    }

    /// The reserved local port the relay socket is bound to.
    pub fn local_port(&self) -> u16 {
        self.local_port
    }

    pub(crate) async fn send(&self, header: &UdpHeader, payload: &[u8]) -> Result<(), RelayError> {
        let mut buf = BytesMut::with_capacity(header.serialized_len() + payload.len());
        header.write_to_buf(&mut buf);
        buf.extend_from_slice(payload);

        self.socket.send(&buf).await.map_err(RelayError::Send)?;
        trace!("sent {} payload bytes for {}", payload.len(), header.address);

        Ok(())
    }

    pub(crate) async fn recv(
        &self,
        header_len: usize,
        max_payload_len: usize,
    ) -> Result<Vec<u8>, RelayError> {
        let mut buf = vec![0; header_len + max_payload_len];
        let len = self.socket.recv(&mut buf).await.map_err(RelayError::Recv)?;

        if len < header_len {
            return Err(RelayError::Truncated { header_len, len });
        }

        buf.truncate(len);
        Ok(buf.split_off(header_len))
    }
}
