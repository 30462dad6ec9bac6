//! Runtime API wire types and transport.

pub mod invocation;
mod transport;

pub use invocation::{Invocation, InvocationError};
pub use transport::{HttpTransport, Transport};
