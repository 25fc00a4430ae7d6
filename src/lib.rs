pub mod actions;
pub mod auth;
pub mod cache;
pub mod cli;
pub mod client;
pub mod config;
pub mod error;
pub mod filter;
pub mod resources;
pub mod session;
pub mod tenant;
pub mod types;
pub mod workspace;

pub use error::ApiError;
pub use workspace::Workspace;

#[cfg(test)]
pub mod testing;
