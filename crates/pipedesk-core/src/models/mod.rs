//! Data models for CRM entities.
//!
//! This module contains the serde types matching the server's JSON:
//!
//! - `User`, `Role`: CRM users and their authorization tier
//! - `Company`, `Domain`, `Industry`: customer accounts
//! - `Contact`: people attached to a company
//! - `Lead`, `LeadStatus`: potential customers and their conversion links
//! - `Deal`, `DealStage`, `DealStatus`: opportunities in the pipeline
//!
//! Each entity has a matching `*Payload` type for create/update requests.

pub mod company;
pub mod contact;
pub mod deal;
pub mod lead;
pub mod user;

pub use company::{Company, CompanyPayload, Domain, DomainPayload, Industry};
pub use contact::{Contact, ContactPayload};
pub use deal::{Deal, DealPayload, DealStage, DealStatus};
pub use lead::{Lead, LeadPayload, LeadStatus};
pub use user::{NewUser, Role, User, UserUpdate};
