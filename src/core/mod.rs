//! Core library components.
//!
//! Scanning, the local store, envelope encryption, device signing and push
//! construction. Nothing in here talks to the network.

pub mod cipher;
pub mod cleanup;
pub mod config;
pub mod constants;
pub mod hash;
pub mod identity;
pub mod ignore;
pub mod push;
pub mod scanner;
pub mod signing;
pub mod store;
pub mod types;
pub mod workspace;
