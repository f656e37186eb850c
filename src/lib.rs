//! Library root for the `dynhub` registry crate.
//!
//! A minimal dynamic-DNS-like registry: home-hosted machines behind changing
//! public IPs report their current address, clients query the last known
//! address of a named service, and both tables (IP history + activity log)
//! are kept bounded by the retention manager.

// Core error handling
pub mod errors;

// Persistence
pub mod store;
pub mod store_sled;

// Data model & core operations
pub mod activity_log;
pub mod ip_history;
pub mod retention;

// Configuration
pub mod config_loader;

// Web server interface
pub mod app_state;
pub mod web;

#[cfg(test)]
mod tests {
    pub mod config;
    pub mod retention;
    pub mod store;
}

pub use errors::{RegistryError, RegistryResult};
