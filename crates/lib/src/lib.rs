//! provision-lib: Core types and logic for the engine provisioner
//!
//! This crate provides everything needed to bring a project's external engine
//! binaries into a usable state:
//! - `staleness`: decides whether compiled artifacts lag behind their sources
//! - `target`: the engines to provision and how each is fetched
//! - `provision`: the orchestrator that installs targets, removes stale
//!   installations and regenerates bindings
//! - `config`: the explicit configuration every run is driven by

pub mod bindings;
pub mod command;
pub mod config;
pub mod consts;
pub mod fetch;
pub mod lock;
pub mod platform;
pub mod provision;
pub mod staleness;
pub mod target;

#[cfg(test)]
pub mod testutil;
