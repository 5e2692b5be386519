//! A small multi-user line chat server.
//!
//! Clients connect over TCP, pick a nickname and then every line they send
//! is broadcast to everyone else. Lines starting with `!` are commands;
//! a few of them (`kick`, `setServerName`, `shutdown`) need an admin login.
//!
//! All broadcasts go through one lock around the roster, so every client
//! sees events in the same order.

pub mod broadcast;
pub mod command;
pub mod config;
pub mod connection;
pub mod error;
pub mod message;
pub mod nickname;
pub mod roster;
pub mod server;
pub mod session;
pub mod types;

pub use config::ServerConfig;
pub use error::ChatError;
pub use server::{Server, run};
