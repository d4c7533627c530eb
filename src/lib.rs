//! Discover, classify, validate and safely edit an OpenSSH client config
//! tree.

pub mod backend;
pub mod config;
pub mod error;
pub mod models;
pub mod persist;
pub mod session;
pub mod ssh_config;
pub mod ssh_service;

pub use backend::{ConfigBackend, LocalBackend};
pub use session::{CloseOutcome, EditSession, PendingClose, ReloadOutcome};
