//! Layered settings registry and OAuth provider configuration for a
//! PowerDNS zone administration service.
//!
//! This module exports the core components for the binary and for tests.

pub mod cli;
pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod logging;
pub mod oauth;
pub mod server;
pub mod settings;
