#![warn(missing_docs)]
#![doc = include_str!("../README.md")]

pub use bytes;
pub use h2;
pub use http;
pub use tokio_tls_listener;

mod callback;
mod conn;
mod engine;
mod error;
mod event_loop;
mod gate;
mod request;
mod response;
mod server;
mod shutdown;
mod socket;
mod tls;

pub use callback::*;
pub use engine::*;
pub use error::*;
pub use event_loop::*;
pub use gate::*;
pub use request::*;
pub use server::*;
pub use socket::SocketArg;
pub use tls::*;

use bytes::Bytes;
use std::{
    fmt,
    future::{poll_fn, Future},
    os::fd::RawFd,
    pin::Pin,
    sync::Arc,
};

type BoxErr = Box<dyn std::error::Error + Send + Sync>;

/// A boxed future that can be handed to a [Scheduler].
pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Represents HTTP/2 result operation.
///
/// This type uses the [h2::Error] as the error type.
pub type Result<T, E = h2::Error> = std::result::Result<T, E>;

fn io_err(error: impl Into<BoxErr>) -> std::io::Error {
    std::io::Error::new(std::io::ErrorKind::Other, error)
}

/// A value handed over by the hosting runtime that the construction gate
/// does not recognize.
///
/// It only remembers how to describe the value, so that configuration errors
/// can name what was actually passed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostValue {
    type_name: String,
    repr: String,
}

impl HostValue {
    /// Describes a value by its type name and textual representation.
    pub fn new(type_name: impl Into<String>, repr: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            repr: repr.into(),
        }
    }

    /// Describes any [Debug](fmt::Debug) value.
    pub fn of<T: fmt::Debug + ?Sized>(value: &T) -> Self {
        Self::new(std::any::type_name::<T>(), format!("{value:?}"))
    }

    /// The absent value.
    pub fn none() -> Self {
        Self::new("None", "None")
    }

    /// Type name of the described value.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// Textual representation of the described value.
    pub fn repr(&self) -> &str {
        &self.repr
    }
}

impl fmt::Display for HostValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (of type `{}`)", self.repr, self.type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_value_names_type_and_value() {
        let value = HostValue::of(&42_u16);
        assert_eq!(value.type_name(), "u16");
        assert_eq!(value.repr(), "42");
        assert_eq!(value.to_string(), "42 (of type `u16`)");
        assert_eq!(HostValue::none().to_string(), "None (of type `None`)");
    }
}
