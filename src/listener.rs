//! Contract between the registry and the HTTP servers it tracks
//!
//! The registry only constructs, configures, starts and stores listeners; it never
//! parses requests. Anything that can bind a port and report its handler keys fits.

use std::fmt;
use std::net::IpAddr;

use async_trait::async_trait;

use crate::errors::ListenerError;

/// Grouping used when listing the handlers a listener serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HandlerCategory {
    Rpc,
    Http,
    Poll,
    JsonRpc,
    StructuredData,
    Stream,
}

impl HandlerCategory {
    pub const ALL: [HandlerCategory; 6] = [
        HandlerCategory::Rpc,
        HandlerCategory::Http,
        HandlerCategory::Poll,
        HandlerCategory::JsonRpc,
        HandlerCategory::StructuredData,
        HandlerCategory::Stream,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::Rpc => "RPC",
            Self::Http => "HTTP",
            Self::Poll => "HTTP (poll)",
            Self::JsonRpc => "JSON-RPC",
            Self::StructuredData => "Structured data",
            Self::Stream => "Stream handlers",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Rpc => "rpc",
            Self::Http => "http",
            Self::Poll => "poll",
            Self::JsonRpc => "json_rpc",
            Self::StructuredData => "structured_data",
            Self::Stream => "stream",
        }
    }
}

impl fmt::Display for HandlerCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A network server bound to one TCP port.
///
/// Lifecycle is constructed, then optionally given a bind address, then started.
/// The port never changes after construction.
#[async_trait]
pub trait Listener: Send + Sync {
    fn port(&self) -> u16;

    fn bind_address(&self) -> IpAddr;

    /// Only meaningful before [`Listener::start`].
    fn set_bind_address(&mut self, address: IpAddr);

    async fn start(&mut self) -> Result<(), ListenerError>;

    /// Stopping an already stopped (or never started) listener is a no-op.
    async fn stop(&self);

    fn handler_keys(&self, category: HandlerCategory) -> Vec<String>;
}

impl fmt::Debug for dyn Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Listener")
            .field("port", &self.port())
            .field("bind_address", &self.bind_address())
            .finish()
    }
}

/// Constructs unstarted listeners for the registry's creation path.
pub trait ListenerFactory: Send + Sync {
    fn create(&self, port: u16) -> Box<dyn Listener>;
}
