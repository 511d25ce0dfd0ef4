use crate::address::AddressError;
use std::io::Error as IoError;
use thiserror::Error;

/// Errors in the protocol itself, as opposed to transport failures.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("unsupported SOCKS version {version:#04x}")]
    Version { version: u8 },

    #[error("no acceptable authentication method")]
    NoAcceptableMethod,

    #[error("unsupported command {command:#04x}")]
    InvalidCommand { command: u8 },

    #[error("unsupported reply {reply:#04x}")]
    InvalidReply { reply: u8 },

    #[error("unsupported address type {address_type:#04x}")]
    InvalidAddressType { address_type: u8 },

    #[error("invalid domain name encoding")]
    InvalidDomainEncoding,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    #[error(transparent)]
    Io(#[from] IoError),
}

impl From<AddressError> for Error {
    fn from(err: AddressError) -> Self {
        match err {
            AddressError::Io(err) => Error::Io(err),
            AddressError::InvalidType(address_type) => {
                Error::Protocol(ProtocolError::InvalidAddressType { address_type })
            }
            AddressError::InvalidEncoding(_) => {
                Error::Protocol(ProtocolError::InvalidDomainEncoding)
            }
        }
    }
}
