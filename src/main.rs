use std::process::ExitCode;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use line_chat_server::config::USAGE;
use line_chat_server::{Server, ServerConfig};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .compact()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .init();
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    init_tracing();

    let config = match ServerConfig::from_args(std::env::args().skip(1)) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    let bind_addr = config.bind_addr();
    let listener = match TcpListener::bind(&bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(addr = %bind_addr, error = %e, "unable to bind");
            return ExitCode::FAILURE;
        }
    };

    info!(
        addr = %bind_addr,
        name = %config.name,
        admin = config.admin_enabled(),
        "chat server listening"
    );

    let server = Arc::new(Server::new(config));
    line_chat_server::run(server, listener).await;

    info!("server stopped");
    ExitCode::SUCCESS
}
