pub mod config;
pub mod dashboard;
pub mod loader;
pub mod output;
pub mod query;
pub mod server;
pub mod store;
