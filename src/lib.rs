pub mod backend;
pub mod cache;
pub mod config;
pub mod consts;
pub mod engine;
pub mod error;
pub mod extract;
pub mod poller;
pub mod server;
pub mod task;
