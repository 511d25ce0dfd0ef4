mod error;
mod handshake;
mod relay;
mod session;

pub mod auth;

pub use crate::{
    auth::Auth,
    error::{AuthNegotiationError, CommandError, Error, RelayError},
    handshake::{Handshake, State},
    relay::UdpAssociation,
    session::Session,
};
