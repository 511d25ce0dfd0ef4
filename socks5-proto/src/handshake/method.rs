/// SOCKS5 authentication method identifier
///
/// Holds the raw method octet so reserved and private-range methods stay
/// representable.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(transparent)]
pub struct Method(pub u8);

impl Method {
    pub const NO_AUTH: Self = Self(0x00);
    pub const GSSAPI: Self = Self(0x01);
    pub const PASSWORD: Self = Self(0x02);
    pub const UNACCEPTABLE: Self = Self(0xff);
}

impl From<u8> for Method {
    fn from(code: u8) -> Self {
        Self(code)
    }
}

impl From<Method> for u8 {
    fn from(method: Method) -> Self {
        method.0
    }
}
