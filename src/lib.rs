pub mod cache;
pub mod clubs;
pub mod config;
pub mod error;
pub mod http_client;
pub mod logging;
pub mod predict;
pub mod retry;
pub mod service;
pub mod stats;
pub mod store;
pub mod upstream;
