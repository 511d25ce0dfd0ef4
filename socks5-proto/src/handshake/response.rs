use super::Method;
use crate::{Error, ProtocolError};
use bytes::{BufMut, BytesMut};
use std::io::Error as IoError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// SOCKS5 greeting reply
///
/// ```plain
/// +-----+--------+
/// | VER | METHOD |
/// +-----+--------+
/// |  1  |   1    |
/// +-----+--------+
/// ```
///
/// Reading a reply whose method octet is `0xFF` fails with
/// [`ProtocolError::NoAcceptableMethod`]; the write side can still emit it
/// so a server may refuse the greeting.
#[derive(Clone, Debug)]
pub struct Response {
    pub method: Method,
}

impl Response {
    pub const fn new(method: Method) -> Self {
        Self { method }
    }

    pub async fn read_from<R>(r: &mut R) -> Result<Self, Error>
    where
        R: AsyncRead + Unpin,
    {
        let version = r.read_u8().await?;

        if version != crate::SOCKS_VERSION {
            return Err(Error::Protocol(ProtocolError::Version { version }));
        }

        let method = Method::from(r.read_u8().await?);

        if method == Method::UNACCEPTABLE {
            return Err(Error::Protocol(ProtocolError::NoAcceptableMethod));
        }

        Ok(Self::new(method))
    }

    pub async fn write_to<W>(&self, w: &mut W) -> Result<(), IoError>
    where
        W: AsyncWrite + Unpin,
    {
        let mut buf = BytesMut::with_capacity(self.serialized_len());
        self.write_to_buf(&mut buf);
        w.write_all(&buf).await
    }

    pub fn write_to_buf<B: BufMut>(&self, buf: &mut B) {
        buf.put_u8(crate::SOCKS_VERSION);
        buf.put_u8(u8::from(self.method));
    }

    pub fn serialized_len(&self) -> usize {
        2
    }
}
