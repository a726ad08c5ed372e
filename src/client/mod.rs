//! Request dispatcher, transport seam and configuration.

mod config;
mod dispatcher;
mod error;
mod transport;

pub use config::{ClientConfig, RuntimeMode};
pub use dispatcher::{sanitize_headers, PortalClient};
pub use error::DispatchError;
pub use transport::{ReqwestTransport, Transport};

#[cfg(test)]
pub(crate) use transport::mock;
