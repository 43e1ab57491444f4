//! Terminal dashboard for a single-signature multisig wallet contract.

pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod logging;
pub mod store;
pub mod ui;
