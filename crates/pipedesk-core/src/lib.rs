//! Core library for pipedesk, a client for the PipeDesk CRM API.
//!
//! This crate contains everything except the terminal front end:
//!
//! - `auth`: session lifecycle management, token/credential storage
//! - `api`: HTTP clients for the auth endpoints and entity CRUD
//! - `models`: serde types for the entities the server exposes
//! - `config`: deployment-time configuration (API base URL, last user)
//!
//! The session manager is the heart of the crate: it owns the bearer token,
//! schedules the refresh that keeps it alive, and broadcasts login/logout
//! transitions to whatever front end is driving it.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
