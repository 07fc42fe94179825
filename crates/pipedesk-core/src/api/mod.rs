//! REST API clients for the CRM service.
//!
//! This module provides:
//! - `ApiClient`: the transport plus the authentication endpoints (the
//!   `AuthApi` port the session manager is injected with)
//! - `CrmClient`: entity CRUD, user administration and integration triggers
//! - `ApiError`: the error taxonomy every operation surfaces
//!
//! All endpoints use JWT bearer token authentication except the login and
//! signup calls.

pub mod client;
pub mod crm;
pub mod error;

pub use client::{ApiClient, TokenResponse};
pub use crm::{CrmClient, IntegrationResponse, MessageResponse};
pub use error::ApiError;
