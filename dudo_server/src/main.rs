//! Multiplayer dice game server using the async actor model.
//!
//! Each room is one actor task spawned through the playground; this
//! binary is the HTTP/WebSocket front end.

use std::net::SocketAddr;

use anyhow::Error;
use ctrlc::set_handler;
use log::info;

use dudo_server::api::{AppState, create_router};
use dudo_server::config::ServerConfig;

const HELP: &str = "\
Run a multiplayer dice game server

USAGE:
  dudo_server [OPTIONS]

OPTIONS:
  --bind       IP:PORT     Server socket bind address  [default: env SERVER_BIND or 127.0.0.1:8000]

FLAGS:
  -h, --help               Print help information

ENVIRONMENT:
  SERVER_BIND              Server bind address (e.g., 0.0.0.0:8080)
  RUST_LOG                 Log filter (e.g., info, dudo=debug)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists.
    let _ = dotenvy::dotenv();

    let mut pargs = pico_args::Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let bind_override: Option<SocketAddr> = pargs.opt_value_from_str("--bind")?;
    let config = ServerConfig::from_env(bind_override)?;

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();
    info!("Starting dice game server at {}", config.bind);

    let state = AppState::new();
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
