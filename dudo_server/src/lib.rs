//! Dice game server: HTTP/WebSocket glue over the `dudo` library.

pub mod api;
pub mod config;
pub mod users;
