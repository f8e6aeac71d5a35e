//! Process-wide table of running HTTP listeners, keyed by port
//!
//! One registry is built by the composition root and handed to everything that needs
//! a listener. It tracks which listener is the default ("main") one, the listener
//! used by callers that ask for port 0.

use std::collections::{btree_map, BTreeMap, HashMap};
use std::fmt::Write;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::errors::RegistryError;
use crate::listener::{HandlerCategory, Listener, ListenerFactory};

pub type SharedListener = Arc<dyn Listener>;

/// Port value meaning "whichever listener is the default".
pub const DEFAULT_PORT: u16 = 0;

#[derive(Default)]
struct RegistryState {
    listeners: HashMap<u16, SharedListener>,
    // Always one of the values in `listeners`.
    default_listener: Option<SharedListener>,
}

impl RegistryState {
    fn is_registered(&self, listener: &SharedListener) -> bool {
        self.listeners
            .values()
            .any(|registered| same_listener(registered, listener))
    }
}

fn same_listener(left: &SharedListener, right: &SharedListener) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(left), Arc::as_ptr(right))
}

pub struct ListenerRegistry {
    state: Mutex<RegistryState>,
    factory: Arc<dyn ListenerFactory>,
}

impl ListenerRegistry {
    pub fn new(factory: Arc<dyn ListenerFactory>) -> Self {
        Self {
            state: Mutex::new(RegistryState::default()),
            factory,
        }
    }

    /// Marks `listener` as the default one.
    ///
    /// The listener must already be registered: membership is checked against every
    /// registered listener by identity, not by looking up its port.
    pub async fn set_default(&self, listener: &SharedListener) -> Result<(), RegistryError> {
        debug!(port = listener.port(), "set_default called");

        let mut state = self.state.lock().await;
        if !state.is_registered(listener) {
            return Err(RegistryError::NotRegistered {
                port: listener.port(),
            });
        }

        state.default_listener = Some(Arc::clone(listener));
        info!(port = listener.port(), "default HTTP listener set");
        Ok(())
    }

    /// The default listener, or `None` when no default is set.
    pub async fn get_default(&self) -> Option<SharedListener> {
        self.state.lock().await.default_listener.clone()
    }

    /// Copy of the current port to listener mapping, safe to iterate while other
    /// callers mutate the registry.
    pub async fn list_all(&self) -> ListenerSnapshot {
        let state = self.state.lock().await;
        ListenerSnapshot {
            listeners: state
                .listeners
                .iter()
                .map(|(port, listener)| (*port, Arc::clone(listener)))
                .collect(),
        }
    }

    /// Registers a listener the caller has already constructed and started.
    pub async fn add_existing(&self, listener: SharedListener) -> Result<(), RegistryError> {
        let port = listener.port();
        debug!(port, "add_existing called");

        let mut state = self.state.lock().await;
        if state.listeners.contains_key(&port) {
            return Err(RegistryError::PortConflict { port });
        }

        state.listeners.insert(port, listener);
        Ok(())
    }

    /// Forgets the listener on `port`, returning whether one was registered.
    ///
    /// The listener keeps running: stopping it is the caller's job. If it was the
    /// default, the registry is left without a default.
    pub async fn remove_by_port(&self, port: u16) -> bool {
        debug!(port, "remove_by_port called");

        let mut state = self.state.lock().await;
        if state
            .default_listener
            .as_ref()
            .is_some_and(|default| default.port() == port)
        {
            state.default_listener = None;
            info!(port, "default HTTP listener cleared");
        }

        state.listeners.remove(&port).is_some()
    }

    /// Unlike [`ListenerRegistry::get_or_create`], never creates anything.
    pub async fn contains_port(&self, port: u16) -> bool {
        self.state.lock().await.listeners.contains_key(&port)
    }

    /// Returns the listener for `port`, creating and starting one if needed.
    ///
    /// Port 0 returns the default listener. Construction, start and insertion
    /// happen under the registry lock, so concurrent callers racing on the same
    /// unregistered port share a single listener.
    pub async fn get_or_create(
        &self,
        port: u16,
        bind_address: Option<IpAddr>,
    ) -> Result<SharedListener, RegistryError> {
        debug!(port, bind_address = ?bind_address, "get_or_create called");

        let mut state = self.state.lock().await;

        if port == DEFAULT_PORT {
            return state.default_listener.clone().ok_or(RegistryError::NoDefault);
        }

        if let Some(default) = state
            .default_listener
            .as_ref()
            .filter(|default| default.port() == port)
        {
            return Ok(Arc::clone(default));
        }

        if let Some(existing) = state.listeners.get(&port) {
            return Ok(Arc::clone(existing));
        }

        let mut listener = self.factory.create(port);
        if let Some(address) = bind_address {
            listener.set_bind_address(address);
        }

        if let Err(err) = listener.start().await {
            warn!(port, error = %err, "failed to start HTTP listener");
            return Err(err.into());
        }

        let listener: SharedListener = Arc::from(listener);
        state.listeners.insert(port, Arc::clone(&listener));

        info!(
            port,
            bind_address = %listener.bind_address(),
            "HTTP listener created"
        );
        Ok(listener)
    }

    /// Handler listing for every registered listener, for the operator console.
    pub async fn format_handler_report(&self) -> String {
        self.list_all().await.format_handler_report()
    }
}

/// Owned copy of the registry contents, ordered by port.
#[derive(Debug, Clone, Default)]
pub struct ListenerSnapshot {
    listeners: BTreeMap<u16, SharedListener>,
}

impl ListenerSnapshot {
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub fn get(&self, port: u16) -> Option<&SharedListener> {
        self.listeners.get(&port)
    }

    pub fn ports(&self) -> Vec<u16> {
        self.listeners.keys().copied().collect()
    }

    pub fn iter(&self) -> btree_map::Iter<'_, u16, SharedListener> {
        self.listeners.iter()
    }

    pub fn format_handler_report(&self) -> String {
        let mut report = String::new();

        for listener in self.listeners.values() {
            let socket = SocketAddr::new(listener.bind_address(), listener.port());
            let _ = writeln!(report, "Registered HTTP handlers for server at {socket}");

            for category in HandlerCategory::ALL {
                let keys = listener.handler_keys(category);
                if category == HandlerCategory::Stream {
                    let _ = writeln!(report, "* {} ({}):", category.label(), keys.len());
                } else {
                    let _ = writeln!(report, "* {}:", category.label());
                }

                for key in keys {
                    let _ = writeln!(report, "\t{key}");
                }
            }

            report.push('\n');
        }

        report
    }
}

impl IntoIterator for ListenerSnapshot {
    type Item = (u16, SharedListener);
    type IntoIter = btree_map::IntoIter<u16, SharedListener>;

    fn into_iter(self) -> Self::IntoIter {
        self.listeners.into_iter()
    }
}

impl<'a> IntoIterator for &'a ListenerSnapshot {
    type Item = (&'a u16, &'a SharedListener);
    type IntoIter = btree_map::Iter<'a, u16, SharedListener>;

    fn into_iter(self) -> Self::IntoIter {
        self.listeners.iter()
    }
}
