use crate::{
    auth::Auth,
    error::{AuthNegotiationError, Error, RelayError},
    handshake::Handshake,
    relay::{self, UdpAssociation},
};
use log::debug;
use socks5_proto::{handshake::Method, Address, Command, UdpHeader};
use std::{
    io::{Error as IoError, ErrorKind, Result as IoResult},
    net::{Ipv4Addr, SocketAddr},
    sync::Arc,
};
use tokio::{io::AsyncWriteExt, net::TcpStream};

/// How many times the whole associate sequence is rerun when the relay
/// socket loses the reserved port to another process.
const MAX_ASSOCIATE_ATTEMPTS: usize = 3;

/// One negotiated client session with a SOCKS5 proxy.
///
/// A session drives exactly one command: either a TCP relay via
/// [`connect_tcp`](Session::connect_tcp), or a UDP relay established
/// lazily by the first [`send_to`](Session::send_to). Sessions are not
/// internally synchronized; one logical flow must drive a session end to
/// end, with external mutual exclusion for anything shared.
pub struct Session {
    proxy_addr: SocketAddr,
    auth: Arc<dyn Auth>,
    control: Option<Handshake<TcpStream>>,
    method: Method,
    destination: Option<Address>,
    bound_addr: Option<Address>,
    udp: Option<UdpAssociation>,
    recv_header_len: Option<usize>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("proxy_addr", &self.proxy_addr)
            .field("control", &self.control)
            .field("method", &self.method)
            .field("destination", &self.destination)
            .field("bound_addr", &self.bound_addr)
            .field("udp", &self.udp)
            .field("recv_header_len", &self.recv_header_len)
            .finish()
    }
}

impl Session {
    /// Dials the proxy, negotiates a method and runs its sub-negotiation.
    pub async fn connect(proxy_addr: SocketAddr, auth: Arc<dyn Auth>) -> Result<Self, Error> {
        let (control, method) = Self::open_control(proxy_addr, &auth).await?;
        debug!("session with {proxy_addr} negotiated, method {:#04x}", u8::from(method));

        Ok(Self {
            proxy_addr,
            auth,
            control: Some(control),
            method,
            destination: None,
            bound_addr: None,
            udp: None,
            recv_header_len: None,
        })
    }

    async fn open_control(
        proxy_addr: SocketAddr,
        auth: &Arc<dyn Auth>,
    ) -> Result<(Handshake<TcpStream>, Method), Error> {
        let stream = TcpStream::connect(proxy_addr)
            .await
            .map_err(Error::ProxyConnect)?;

        let mut control = Handshake::new(stream);
        let method = control.negotiate(&[auth.as_handshake_method()]).await?;

        auth.execute(control.stream_mut())
            .await
            .map_err(|err| Error::AuthNegotiation(AuthNegotiationError::SubNegotiation(err)))?;

        Ok((control, method))
    }

    /// The method selected during negotiation. Fixed for the session's
    /// lifetime.
    pub fn selected_method(&self) -> Method {
        self.method
    }

    /// The destination of the most recent command or datagram.
    pub fn destination(&self) -> Option<&Address> {
        self.destination.as_ref()
    }

    /// The bound address from the most recent succeeded command reply.
    pub fn bound_addr(&self) -> Option<&Address> {
        self.bound_addr.as_ref()
    }

    pub fn udp_association(&self) -> Option<&UdpAssociation> {
        self.udp.as_ref()
    }

    /// Local address of the control stream.
    pub fn local_addr(&self) -> IoResult<SocketAddr> {
        match &self.control {
            Some(control) => control.stream().local_addr(),
            None => Err(IoError::new(ErrorKind::NotConnected, "session is closed")),
        }
    }

    /// Remote (proxy) address of the control stream.
    pub fn peer_addr(&self) -> IoResult<SocketAddr> {
        match &self.control {
            Some(control) => control.stream().peer_addr(),
            None => Err(IoError::new(ErrorKind::NotConnected, "session is closed")),
        }
    }

    /// Issues a CONNECT for `destination` and validates the reply.
    ///
    /// On success the control stream carries the relayed connection; drive
    /// it through [`stream_mut`](Session::stream_mut).
    pub async fn connect_tcp(&mut self, destination: Address) -> Result<Address, Error> {
        if matches!(destination, Address::Domain(..)) {
            return Err(Error::DomainDestination);
        }

        let control = self.control.as_mut().ok_or(Error::Closed)?;
        let bound = control.request(Command::Connect, destination.clone()).await?;

        self.destination = Some(destination);
        self.bound_addr = Some(bound.clone());

        Ok(bound)
    }

    /// The control stream; after a successful CONNECT this is the relayed
    /// TCP connection.
    pub fn stream_mut(&mut self) -> Result<&mut TcpStream, Error> {
        match &mut self.control {
            Some(control) => Ok(control.stream_mut()),
            None => Err(Error::Closed),
        }
    }

    /// Sends `payload` to `destination` through the UDP relay, running the
    /// associate sequence on first use.
    ///
    /// Datagrams go out unfragmented (`FRAG = 0`). The destination's
    /// address family is recorded so [`recv`](Session::recv) knows the
    /// inbound header length.
    pub async fn send_to(&mut self, destination: Address, payload: &[u8]) -> Result<(), Error> {
        if self.control.is_none() {
            return Err(Error::Closed);
        }
        if matches!(destination, Address::Domain(..)) {
            return Err(Error::DomainDestination);
        }

        let assoc = match self.udp.take() {
            Some(assoc) => assoc,
            None => self.associate().await?,
        };

        let header = UdpHeader::new(0, destination);
        let sent = assoc.send(&header, payload).await;
        self.udp = Some(assoc);
        sent?;

        self.recv_header_len = Some(header.serialized_len());
        self.destination = Some(header.address);

        Ok(())
    }

    /// Receives one relayed datagram, reading at most `header length +
    /// max_payload_len` bytes, and returns the payload behind the header.
    ///
    /// Fails until a [`send_to`](Session::send_to) has recorded the
    /// destination address family; the header length is never guessed.
    pub async fn recv(&mut self, max_payload_len: usize) -> Result<Vec<u8>, Error> {
        if self.control.is_none() {
            return Err(Error::Closed);
        }

        let header_len = self.recv_header_len.ok_or(RelayError::HeaderLengthUnknown)?;
        let assoc = self.udp.as_ref().ok_or(RelayError::HeaderLengthUnknown)?;

        Ok(assoc.recv(header_len, max_payload_len).await?)
    }

    /// Runs the associate sequence: reserve a port, issue ASSOCIATE from
    /// `0.0.0.0:<port>`, open the relay socket against the bound address.
    ///
    /// Losing the reserved port to another process is the one retryable
    /// failure. A retry starts the sequence over on a fresh control
    /// connection, since an association cannot outlive the exchange that
    /// created it.
    async fn associate(&mut self) -> Result<UdpAssociation, Error> {
        let mut attempt = 1;

        loop {
            match self.associate_once().await {
                Ok(assoc) => return Ok(assoc),
                Err(err @ Error::Relay(RelayError::Open(_)))
                    if attempt < MAX_ASSOCIATE_ATTEMPTS =>
                {
                    debug!("relay open lost the reserved port (attempt {attempt}): {err}");
                    attempt += 1;

                    let (control, _) = Self::open_control(self.proxy_addr, &self.auth).await?;
                    self.control = Some(control);
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn associate_once(&mut self) -> Result<UdpAssociation, Error> {
        let port = relay::reserve_ephemeral_port().await?;

        let control = self.control.as_mut().ok_or(Error::Closed)?;
        let bound = control
            .request(Command::Associate, Address::from((Ipv4Addr::UNSPECIFIED, port)))
            .await?;

        Ok(UdpAssociation::open(port, bound, self.proxy_addr.ip()).await?)
    }

    /// Releases the relay socket, then shuts down the control connection.
    ///
    /// Calling it again is a no-op. Later operations fail with
    /// [`Error::Closed`].
    pub async fn close(&mut self) {
        self.udp = None;
        self.recv_header_len = None;

        if let Some(mut control) = self.control.take() {
            let _ = control.stream_mut().shutdown().await;
            debug!("session with {} closed", self.proxy_addr);
        }
    }
}
