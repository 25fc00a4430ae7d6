pub mod actions;
pub mod auth;
pub mod data;
pub mod settings;
pub mod tenant;
