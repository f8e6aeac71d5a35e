use std::{
    collections::BTreeSet,
    env,
    net::{IpAddr, SocketAddr},
};

use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
pub const DEFAULT_BIND_PORT: u16 = 9000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub bind_addr: IpAddr,
    pub bind_port: u16,
    pub extra_ports: Vec<u16>,
    pub console_enabled: bool,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_ADDR must be a valid IP address")]
    InvalidAddress,
    #[error("BIND_PORT must be a non-zero u16")]
    InvalidPort,
    #[error("EXTRA_PORTS entry `{0}` must be a non-zero u16")]
    InvalidExtraPort(String),
    #[error("port {0} is configured more than once")]
    DuplicatePort(u16),
    #[error("CONSOLE_ENABLED must be true or false")]
    InvalidConsoleFlag,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Same parsing as [`Config::from_env`], reading values through `lookup`.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let bind_addr = read("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<IpAddr>()
            .map_err(|_| ConfigError::InvalidAddress)?;

        let bind_port = read("BIND_PORT")
            .map(|value| parse_port(&value).ok_or(ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(DEFAULT_BIND_PORT);

        let mut seen = BTreeSet::from([bind_port]);
        let mut extra_ports = Vec::new();
        for entry in read("EXTRA_PORTS")
            .as_deref()
            .unwrap_or_default()
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
        {
            let port =
                parse_port(entry).ok_or_else(|| ConfigError::InvalidExtraPort(entry.to_string()))?;
            if !seen.insert(port) {
                return Err(ConfigError::DuplicatePort(port));
            }
            extra_ports.push(port);
        }

        let console_enabled = match read("CONSOLE_ENABLED").as_deref() {
            None => true,
            Some(value) => match value.to_ascii_lowercase().as_str() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => return Err(ConfigError::InvalidConsoleFlag),
            },
        };

        Ok(Self {
            bind_addr,
            bind_port,
            extra_ports,
            console_enabled,
        })
    }

    pub fn bind_socket(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.bind_port)
    }
}

fn parse_port(value: &str) -> Option<u16> {
    value.parse::<u16>().ok().filter(|port| *port != 0)
}
