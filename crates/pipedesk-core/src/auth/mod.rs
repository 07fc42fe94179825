//! Authentication module: session lifecycle and credential storage.
//!
//! This module provides:
//! - `SessionManager`: owns the access token, its expiry countdown, refresh
//!   scheduling and verification, and broadcasts login/logout transitions
//! - `AuthApi`: the port the manager drives the auth endpoints through
//! - `TokenStore`: the two persisted keys that survive a restart
//! - `CredentialStore`: OS-keychain storage for remembered logins

pub mod credentials;
pub mod session;
pub mod store;

pub use credentials::CredentialStore;
pub use session::{AuthApi, AuthState, Session, SessionManager};
pub use store::TokenStore;
