//! Assume an AWS role with MFA and keep the temporary session cached on
//! disk until it expires.
//!
//! [`SessionManager::authenticate`] reuses the cached session while it is
//! valid, otherwise prompts for an MFA code and calls STS. The active
//! session is exported as `AWS_*` environment variables so SDK clients and
//! spawned commands pick it up.

pub mod aws;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod environment;
pub mod error;
pub mod mfa;
pub mod session;

pub use error::{AuthError, ConfigurationError};
pub use session::{ActiveSession, SessionManager, SessionRecord, SessionState, SessionStore};
