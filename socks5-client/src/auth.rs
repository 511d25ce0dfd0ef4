//! Client-side authentication adapters.
//!
//! An adapter decides the method offered in the greeting and runs that
//! method's sub-negotiation once the proxy selects it. Only
//! [`NoAuth`] ships; credential-carrying methods plug in through the
//! [`Auth`] trait.

use async_trait::async_trait;
use socks5_proto::handshake::Method;
use std::io::Result;
use tokio::net::TcpStream;

#[async_trait]
pub trait Auth: Send + Sync {
    fn as_handshake_method(&self) -> Method;
    async fn execute(&self, stream: &mut TcpStream) -> Result<()>;
}

/// The `NO AUTHENTICATION REQUIRED` method. No sub-negotiation happens.
pub struct NoAuth;

impl NoAuth {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Auth for NoAuth {
    fn as_handshake_method(&self) -> Method {
        Method::NO_AUTH
    }

    async fn execute(&self, _: &mut TcpStream) -> Result<()> {
        Ok(())
    }
}

impl Default for NoAuth {
    fn default() -> Self {
        Self::new()
    }
}
