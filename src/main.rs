use std::sync::Arc;

use http_listener_registry::{
    config::Config,
    console::{self, ConsoleExit},
    http::server::HttpListenerFactory,
    logging, ListenerRegistry,
};
use tokio::io::BufReader;
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let registry = ListenerRegistry::new(Arc::new(HttpListenerFactory));

    let main_listener = registry
        .get_or_create(config.bind_port, Some(config.bind_addr))
        .await?;
    registry.set_default(&main_listener).await?;

    for port in &config.extra_ports {
        registry.get_or_create(*port, Some(config.bind_addr)).await?;
    }

    info!(
        bind_socket = %config.bind_socket(),
        extra_ports = ?config.extra_ports,
        "listeners started"
    );

    let exit = if config.console_enabled {
        console::run_console(
            &registry,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )
        .await?
    } else {
        ConsoleExit::Eof
    };

    if exit == ConsoleExit::Eof {
        info!("serving until ctrl-c");
        tokio::signal::ctrl_c().await?;
    }

    // Removal never stops a listener; the process started them, so it stops them.
    for (port, listener) in registry.list_all().await {
        registry.remove_by_port(port).await;
        listener.stop().await;
    }

    info!("shutdown complete");
    Ok(())
}
