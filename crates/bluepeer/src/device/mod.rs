//! Local device abstraction: configuration, power-on, connections

pub mod adapter;
pub mod config;
pub mod connection;
pub mod constants;
pub mod features;
pub mod types;

#[cfg(test)]
mod tests;

pub use adapter::{Device, LocalVersionInformation};
pub use config::DeviceConfiguration;
pub use connection::Connection;
pub use features::{ExtendedFeaturesPage, LeFeatures, LmpFeatures, LmpHostFeatures, RemoteFeatures};
pub use types::*;
