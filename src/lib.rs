pub mod cache;
pub mod clock;
pub mod config;
pub mod context;
pub mod credentials;
pub mod duration;
pub mod format;
pub mod models;
pub mod portfolio;
#[cfg(feature = "http")]
pub mod server;
pub mod sources;
