//! axum-backed implementation of [`Listener`]

use std::collections::{BTreeMap, BTreeSet};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::{net::TcpListener, sync::watch};
use tracing::{error, info};

use crate::errors::ListenerError;
use crate::http::handlers::{HANDLERS_PATH, HEALTH_PATH};
use crate::listener::{HandlerCategory, Listener, ListenerFactory};
use crate::{build_app, ListenerState};

/// Handler keys known to one listener, grouped by category and kept sorted.
#[derive(Debug, Default)]
pub struct HandlerKeys {
    keys: RwLock<BTreeMap<HandlerCategory, BTreeSet<String>>>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct HandlerListing {
    pub category: &'static str,
    pub keys: Vec<String>,
}

impl HandlerKeys {
    /// Returns false if the key was already present.
    pub fn register(&self, category: HandlerCategory, key: impl Into<String>) -> bool {
        self.keys
            .write()
            .entry(category)
            .or_default()
            .insert(key.into())
    }

    pub fn keys(&self, category: HandlerCategory) -> Vec<String> {
        self.keys
            .read()
            .get(&category)
            .map(|keys| keys.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn listing(&self) -> Vec<HandlerListing> {
        HandlerCategory::ALL
            .into_iter()
            .map(|category| HandlerListing {
                category: category.as_str(),
                keys: self.keys(category),
            })
            .collect()
    }
}

pub struct HttpListener {
    port: u16,
    bind_address: IpAddr,
    handlers: Arc<HandlerKeys>,
    local_addr: Option<SocketAddr>,
    shutdown: Option<watch::Sender<bool>>,
}

impl HttpListener {
    pub fn new(port: u16) -> Self {
        let handlers = Arc::new(HandlerKeys::default());
        handlers.register(HandlerCategory::Http, HEALTH_PATH);
        handlers.register(HandlerCategory::Http, HANDLERS_PATH);

        Self {
            port,
            bind_address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            handlers,
            local_addr: None,
            shutdown: None,
        }
    }

    /// Socket actually bound, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.local_addr
    }

    pub fn is_started(&self) -> bool {
        self.shutdown.is_some()
    }

    fn bind_error(&self, source: std::io::Error) -> ListenerError {
        ListenerError::Bind {
            address: self.bind_address,
            port: self.port,
            source,
        }
    }
}

#[async_trait]
impl Listener for HttpListener {
    fn port(&self) -> u16 {
        self.port
    }

    fn bind_address(&self) -> IpAddr {
        self.bind_address
    }

    fn set_bind_address(&mut self, address: IpAddr) {
        self.bind_address = address;
    }

    async fn start(&mut self) -> Result<(), ListenerError> {
        if self.is_started() {
            return Err(ListenerError::AlreadyStarted { port: self.port });
        }

        let socket = TcpListener::bind(SocketAddr::new(self.bind_address, self.port))
            .await
            .map_err(|err| self.bind_error(err))?;
        let local_addr = socket.local_addr().map_err(|err| self.bind_error(err))?;

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let app = build_app(ListenerState::new(self.port, self.handlers.clone()));
        let port = self.port;

        tokio::spawn(async move {
            let shutdown = async move {
                // Dropping every handle must not stop the server, only stop() does.
                if shutdown_rx.wait_for(|stopped| *stopped).await.is_err() {
                    std::future::pending::<()>().await;
                }
            };

            if let Err(err) = axum::serve(socket, app.into_make_service())
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!(port, error = %err, "HTTP listener terminated");
                return;
            }

            info!(port, "HTTP listener stopped");
        });

        self.local_addr = Some(local_addr);
        self.shutdown = Some(shutdown_tx);

        info!(local_addr = %local_addr, "HTTP listener started");
        Ok(())
    }

    async fn stop(&self) {
        if let Some(shutdown) = &self.shutdown {
            shutdown.send_replace(true);
        }
    }

    fn handler_keys(&self, category: HandlerCategory) -> Vec<String> {
        self.handlers.keys(category)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct HttpListenerFactory;

impl ListenerFactory for HttpListenerFactory {
    fn create(&self, port: u16) -> Box<dyn Listener> {
        Box::new(HttpListener::new(port))
    }
}
