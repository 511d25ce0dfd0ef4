use super::Method;
use crate::{Error, ProtocolError};
use bytes::{BufMut, BytesMut};
use std::io::Error as IoError;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// SOCKS5 greeting
///
/// ```plain
/// +-----+----------+----------+
/// | VER | NMETHODS | METHODS  |
/// +-----+----------+----------+
/// |  1  |    1     | 1 to 255 |
/// +-----+----------+----------+
/// ```
#[derive(Clone, Debug)]
pub struct Request {
    pub methods: Vec<Method>,
}

impl Request {
    pub const fn new(methods: Vec<Method>) -> Self {
        Self { methods }
    }

    pub async fn read_from<R>(r: &mut R) -> Result<Self, Error>
    where
        R: AsyncRead + Unpin,
    {
        let version = r.read_u8().await?;

        if version != crate::SOCKS_VERSION {
            return Err(Error::Protocol(ProtocolError::Version { version }));
        }

        let mlen = r.read_u8().await?;
        let mut buf = vec![0; mlen as usize];
        r.read_exact(&mut buf).await?;

        let methods = buf.into_iter().map(Method::from).collect();

        Ok(Self::new(methods))
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
        buf.put_u8(self.methods.len() as u8);

        for method in &self.methods {
            buf.put_u8(u8::from(*method));
        }
    }

    pub fn serialized_len(&self) -> usize {
        1 + 1 + self.methods.len()
    }
}
