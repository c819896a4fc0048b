//! File Uploader HTTP front service
//!
//! Serves a welcome page on `/`, a status check on `/api/test`, and a JSON
//! 404 for everything else.

pub mod config;
pub mod handler;
pub mod http;
pub mod logger;
pub mod routing;
pub mod server;

pub use config::{AppState, Config};
pub use routing::Route;
pub use server::SignalHandler;
