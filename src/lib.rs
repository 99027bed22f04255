pub mod apply;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod platform;
pub mod server;
pub mod shutdown;
pub mod webhook;
pub mod workflow;
