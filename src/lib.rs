pub mod api;
pub mod cli;
pub mod error;
pub mod navigation;
pub mod resolver;
pub mod server;
