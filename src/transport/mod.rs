//! HTTP transport: the only place that talks to the network.

pub mod http;

pub use http::{HttpTransport, TransportError};
