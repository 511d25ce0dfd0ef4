//! Greeting exchange: method advertisement and method selection.

mod method;
mod request;
mod response;

pub use self::{method::Method, request::Request, response::Response};
