//! Authorization and validation rules for logging and editing cost entries.
//!
//! The crate is laid out as a hexagon: [`domain`] holds the records, the
//! permission model, field validation and the service implementing the
//! driving port; [`outbound`] holds adapters for the driven ports;
//! [`config`] loads the tunable policy.

pub mod config;
pub mod domain;
pub mod outbound;

pub use config::{CostsSettings, SettingsError};
