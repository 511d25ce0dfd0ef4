use crate::handshake::State;
use socks5_proto::{Address, Error as ProtoError, Reply};
use std::io::Error as IoError;
use thiserror::Error;

/// Everything a session operation can fail with.
///
/// Lower-level transport and protocol causes stay reachable through
/// [`std::error::Error::source`]; nothing is flattened into a message
/// string.
#[derive(Debug, Error)]
pub enum Error {
    /// The control stream to the proxy could not be established.
    #[error("could not connect to proxy")]
    ProxyConnect(#[source] IoError),

    #[error("authentication negotiation failed")]
    AuthNegotiation(#[from] AuthNegotiationError),

    #[error("command exchange failed")]
    Command(#[from] CommandError),

    #[error("UDP relay failed")]
    Relay(#[from] RelayError),

    /// A greeting or command was attempted in a handshake state that cannot
    /// accept one; nothing is written to the stream.
    #[error("handshake is {0:?} and accepts no further exchange")]
    HandshakeState(State),

    /// Domain-name destinations are defined by the protocol but not
    /// implemented by this client.
    #[error("domain name destinations are not supported")]
    DomainDestination,

    #[error("session is closed")]
    Closed,
}

#[derive(Debug, Error)]
pub enum AuthNegotiationError {
    #[error("greeting exchange with the proxy failed")]
    Exchange(#[source] ProtoError),

    #[error("proxy accepted none of the offered methods")]
    NoAcceptableMethod,

    #[error("proxy selected method {0:#04x}, which was never offered")]
    UnofferedMethod(u8),

    #[error("authentication sub-negotiation failed")]
    SubNegotiation(#[source] IoError),
}

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("command exchange with the proxy failed")]
    Exchange(#[source] ProtoError),

    #[error("proxy rejected the command: {0}")]
    Rejected(Reply),
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("could not reserve an ephemeral local port")]
    PortReservation(#[source] IoError),

    /// The reserved port can be lost to another process between the
    /// reservation being released and the relay socket binding it.
    #[error("could not open the relay socket")]
    Open(#[source] IoError),

    #[error("relay endpoint {0} is not a usable socket address")]
    Endpoint(Address),

    #[error("could not send through the relay")]
    Send(#[source] IoError),

    #[error("could not receive from the relay")]
    Recv(#[source] IoError),

    #[error("datagram of {len} bytes is shorter than its {header_len}-byte header")]
    Truncated { header_len: usize, len: usize },

    #[error("no datagram has been sent yet, the inbound header length is unknown")]
    HeaderLengthUnknown,
}
