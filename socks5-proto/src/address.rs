use byteorder::{BigEndian, ReadBytesExt};
use bytes::BufMut;
use std::{
    fmt::{Display, Formatter, Result as FmtResult},
    io::{Cursor, Error as IoError, ErrorKind, Result as IoResult},
    net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, SocketAddrV4, SocketAddrV6},
    string::FromUtf8Error,
};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};

/// SOCKS5 address
///
/// One variant per wire address type; the `ATYP` octet and the encoded length
/// are fully determined by the variant:
///
/// | variant  | ATYP   | encoded length          |
/// |----------|--------|-------------------------|
/// | `Ipv4`   | `0x01` | 4 + 2                   |
/// | `Domain` | `0x03` | 1 + name length + 2     |
/// | `Ipv6`   | `0x04` | 16 + 2                  |
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub enum Address {
    Ipv4(SocketAddrV4),
    Ipv6(SocketAddrV6),
    Domain(String, u16),
}

impl Address {
    const ATYP_IPV4: u8 = 0x01;
    const ATYP_DOMAIN: u8 = 0x03;
    const ATYP_IPV6: u8 = 0x04;

    pub fn unspecified() -> Self {
        Address::Ipv4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, 0))
    }

    pub fn port(&self) -> u16 {
        match self {
            Address::Ipv4(addr) => addr.port(),
            Address::Ipv6(addr) => addr.port(),
            Address::Domain(_, port) => *port,
        }
    }

    /// Resolves to a connectable socket address.
    ///
    /// Domain addresses are accepted only when the name is an IP literal;
    /// real name resolution does not belong to the protocol layer.
    pub fn to_socket_addr(&self) -> IoResult<SocketAddr> {
        match self {
            Address::Ipv4(addr) => Ok(SocketAddr::V4(*addr)),
            Address::Ipv6(addr) => Ok(SocketAddr::V6(*addr)),
            Address::Domain(name, port) => match name.parse::<IpAddr>() {
                Ok(ip) => Ok(SocketAddr::new(ip, *port)),
                Err(_) => Err(IoError::new(
                    ErrorKind::Unsupported,
                    format!("domain address {name} requires resolution"),
                )),
            },
        }
    }

    pub async fn read_from<R>(r: &mut R) -> Result<Self, AddressError>
    where
        R: AsyncRead + Unpin,
    {
        let atyp = r.read_u8().await?;

        match atyp {
            Self::ATYP_IPV4 => {
                let mut buf = [0; 6];
                r.read_exact(&mut buf).await?;
                let mut rdr = Cursor::new(buf);

                let ip = Ipv4Addr::from(ReadBytesExt::read_u32::<BigEndian>(&mut rdr)?);
                let port = ReadBytesExt::read_u16::<BigEndian>(&mut rdr)?;

                Ok(Self::Ipv4(SocketAddrV4::new(ip, port)))
            }
            Self::ATYP_DOMAIN => {
                let len = r.read_u8().await? as usize;

                let mut buf = vec![0; len + 2];
                r.read_exact(&mut buf).await?;

                let port = ReadBytesExt::read_u16::<BigEndian>(&mut &buf[len..])?;
                buf.truncate(len);

                Ok(Self::Domain(String::from_utf8(buf)?, port))
            }
            Self::ATYP_IPV6 => {
                let mut buf = [0; 18];
                r.read_exact(&mut buf).await?;
                let mut rdr = Cursor::new(buf);

                let ip = Ipv6Addr::from(ReadBytesExt::read_u128::<BigEndian>(&mut rdr)?);
                let port = ReadBytesExt::read_u16::<BigEndian>(&mut rdr)?;

                Ok(Self::Ipv6(SocketAddrV6::new(ip, port, 0, 0)))
            }
            atyp => Err(AddressError::InvalidType(atyp)),
        }
    }

    pub fn write_to_buf<B: BufMut>(&self, buf: &mut B) {
        match self {
            Self::Ipv4(addr) => {
                buf.put_u8(Self::ATYP_IPV4);
                buf.put_slice(&addr.ip().octets());
                buf.put_u16(addr.port());
            }
            Self::Ipv6(addr) => {
                buf.put_u8(Self::ATYP_IPV6);
                buf.put_slice(&addr.ip().octets());
                buf.put_u16(addr.port());
            }
            Self::Domain(name, port) => {
                buf.put_u8(Self::ATYP_DOMAIN);
                buf.put_u8(name.len() as u8);
                buf.put_slice(name.as_bytes());
                buf.put_u16(*port);
            }
        }
    }

    pub fn serialized_len(&self) -> usize {
        1 + match self {
            Self::Ipv4(_) => 4 + 2,
            Self::Ipv6(_) => 16 + 2,
            Self::Domain(name, _) => 1 + name.len() + 2,
        }
    }
}

impl Display for Address {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Address::Ipv4(addr) => write!(f, "{addr}"),
            Address::Ipv6(addr) => write!(f, "{addr}"),
            Address::Domain(name, port) => write!(f, "{name}:{port}"),
        }
    }
}

impl From<SocketAddr> for Address {
    fn from(addr: SocketAddr) -> Self {
        match addr {
            SocketAddr::V4(addr) => Address::Ipv4(addr),
            SocketAddr::V6(addr) => Address::Ipv6(addr),
        }
    }
}

impl From<SocketAddrV4> for Address {
    fn from(addr: SocketAddrV4) -> Self {
        Address::Ipv4(addr)
    }
}

impl From<SocketAddrV6> for Address {
    fn from(addr: SocketAddrV6) -> Self {
        Address::Ipv6(addr)
    }
}

impl From<(Ipv4Addr, u16)> for Address {
    fn from((ip, port): (Ipv4Addr, u16)) -> Self {
        Address::Ipv4(SocketAddrV4::new(ip, port))
    }
}

impl From<(Ipv6Addr, u16)> for Address {
    fn from((ip, port): (Ipv6Addr, u16)) -> Self {
        Address::Ipv6(SocketAddrV6::new(ip, port, 0, 0))
    }
}

impl From<(String, u16)> for Address {
    fn from((name, port): (String, u16)) -> Self {
        Address::Domain(name, port)
    }
}

impl From<(&str, u16)> for Address {
    fn from((name, port): (&str, u16)) -> Self {
        Address::Domain(name.to_owned(), port)
    }
}

#[derive(Debug, Error)]
pub enum AddressError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("unsupported address type {0:#04x}")]
    InvalidType(u8),
    #[error("invalid domain name encoding")]
    InvalidEncoding(#[from] FromUtf8Error),
}
