use crate::error::{AuthNegotiationError, CommandError, Error};
use log::debug;
use socks5_proto::{
    handshake::{Method, Request as Greeting, Response as GreetingResponse},
    Address, Command, Error as ProtoError, ProtocolError, Reply, Request, Response,
};
use tokio::io::{AsyncRead, AsyncWrite};

/// Progress of one control connection through the SOCKS5 exchanges.
///
/// `Established` and `Failed` are terminal: an engine never retries or
/// re-negotiates, recovering means opening a new control connection.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum State {
    Init,
    AuthNegotiating,
    AuthNegotiated,
    CommandPending,
    Established,
    Failed,
}

/// Drives one control stream through method negotiation and a single
/// command exchange.
#[derive(Debug)]
pub struct Handshake<S> {
    stream: S,
    state: State,
    method: Option<Method>,
}

impl<S> Handshake<S> {
    /// Wraps an already-open control stream.
    pub fn new(stream: S) -> Self {
        Self {
            stream,
            state: State::Init,
            method: None,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// The method the proxy selected, once negotiation has succeeded.
    pub fn method(&self) -> Option<Method> {
        self.method
    }

    pub fn stream(&self) -> &S {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut S {
        &mut self.stream
    }

    pub fn into_stream(self) -> S {
        self.stream
    }
}

impl<S> Handshake<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    /// Offers `methods` to the proxy and records the one it selects.
    ///
    /// The selection must be one of the offered methods; anything else,
    /// including the `0xFF` refusal, fails the engine for good.
    pub async fn negotiate(&mut self, methods: &[Method]) -> Result<Method, Error> {
        if self.state != State::Init {
            return Err(Error::HandshakeState(self.state));
        }

        self.state = State::AuthNegotiating;

        match self.exchange_greeting(methods).await {
            Ok(method) => {
                debug!("proxy selected auth method {:#04x}", u8::from(method));
                self.method = Some(method);
                self.state = State::AuthNegotiated;
                Ok(method)
            }
            Err(err) => {
                self.state = State::Failed;
                Err(Error::AuthNegotiation(err))
            }
        }
    }

    async fn exchange_greeting(
        &mut self,
        methods: &[Method],
    ) -> Result<Method, AuthNegotiationError> {
        let greeting = Greeting::new(methods.to_vec());
        greeting
            .write_to(&mut self.stream)
            .await
            .map_err(|err| AuthNegotiationError::Exchange(ProtoError::Io(err)))?;

        let reply = GreetingResponse::read_from(&mut self.stream)
            .await
            .map_err(|err| match err {
                ProtoError::Protocol(ProtocolError::NoAcceptableMethod) => {
                    AuthNegotiationError::NoAcceptableMethod
                }
                err => AuthNegotiationError::Exchange(err),
            })?;

        if !methods.contains(&reply.method) {
            return Err(AuthNegotiationError::UnofferedMethod(u8::from(
                reply.method,
            )));
        }

        Ok(reply.method)
    }

    /// Sends one command request and returns the bound address from a
    /// succeeded reply. Any other reply code fails the engine and is
    /// carried in the error.
    pub async fn request(&mut self, command: Command, address: Address) -> Result<Address, Error> {
        if self.state != State::AuthNegotiated {
            return Err(Error::HandshakeState(self.state));
        }

        self.state = State::CommandPending;

        match self.exchange_command(command, address).await {
            Ok(bound) => {
                debug!("{command:?} established, proxy bound to {bound}");
                self.state = State::Established;
                Ok(bound)
            }
            Err(err) => {
                self.state = State::Failed;
                Err(Error::Command(err))
            }
        }
    }

    async fn exchange_command(
        &mut self,
        command: Command,
        address: Address,
    ) -> Result<Address, CommandError> {
        let request = Request::new(command, address);
        request
            .write_to(&mut self.stream)
            .await
            .map_err(|err| CommandError::Exchange(ProtoError::Io(err)))?;

        let response = Response::read_from(&mut self.stream)
            .await
            .map_err(CommandError::Exchange)?;

        match response.reply {
            Reply::Succeeded => Ok(response.address),
            reply => Err(CommandError::Rejected(reply)),
        }
    }
}
