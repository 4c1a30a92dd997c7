pub mod error;
pub mod validation;
pub mod model;
pub mod config;
pub mod progress;
pub mod auth;
pub mod directory;
pub mod ops;
pub mod store;
pub mod cli;
