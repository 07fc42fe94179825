//! Entity CRUD operations against the CRM API.
//!
//! `CrmClient` is the collaborator the rest of the application goes through
//! to work with companies, contacts, leads, deals and users. It never holds
//! a token itself: the bearer token is read from the session manager on
//! every request, so a refresh landing mid-session is picked up
//! transparently.

use anyhow::{Context, Result};
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::auth::SessionManager;
use crate::models::{
    Company, CompanyPayload, Contact, ContactPayload, Deal, DealPayload, Industry, Lead,
    LeadPayload, User, UserUpdate,
};

use super::{ApiClient, ApiError};

/// Plain-message response from the integration triggers
#[derive(Debug, Clone, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Response from registering the CRM with Gong
#[derive(Debug, Clone, Deserialize)]
pub struct IntegrationResponse {
    pub integration_id: String,
}

#[derive(Clone)]
pub struct CrmClient {
    client: Client,
    base_url: String,
    session: SessionManager,
}

impl CrmClient {
    /// Shares the ApiClient's connection pool
    pub fn new(api: &ApiClient, session: SessionManager) -> Self {
        Self {
            client: api.http().clone(),
            base_url: api.base_url().to_string(),
            session,
        }
    }

    fn token(&self) -> Result<String> {
        match self.session.access_token() {
            Some(token) => Ok(token),
            None => Err(ApiError::SessionExpired.into()),
        }
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body).into())
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .bearer_auth(self.token()?)
            .send()
            .await
            .with_context(|| format!("Failed to send GET request to {}", url))?;

        let response = Self::check(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn post_json<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token()?)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send POST request to {}", url))?;

        let response = Self::check(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    /// POST without a body, for the action endpoints
    async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.token()?)
            .send()
            .await
            .with_context(|| format!("Failed to send POST request to {}", url))?;

        let response = Self::check(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn put_json<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .put(&url)
            .bearer_auth(self.token()?)
            .json(body)
            .send()
            .await
            .with_context(|| format!("Failed to send PUT request to {}", url))?;

        let response = Self::check(response).await?;
        response
            .json()
            .await
            .with_context(|| format!("Failed to parse JSON response from {}", url))
    }

    async fn delete_resource(&self, path: &str) -> Result<()> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .delete(&url)
            .bearer_auth(self.token()?)
            .send()
            .await
            .with_context(|| format!("Failed to send DELETE request to {}", url))?;

        Self::check(response).await?;
        Ok(())
    }

    // =========================================================================
    // Companies
    // =========================================================================

    pub async fn list_companies(&self) -> Result<Vec<Company>> {
        self.get_json("/companies").await
    }

    pub async fn get_company(&self, id: i64) -> Result<Company> {
        self.get_json(&format!("/companies/{}", id)).await
    }

    pub async fn companies_by_industry(&self, industry: Industry) -> Result<Vec<Company>> {
        self.get_json(&format!("/companies/industry/{}", industry))
            .await
    }

    pub async fn create_company(&self, company: &CompanyPayload) -> Result<Company> {
        self.post_json("/companies", company).await
    }

    pub async fn update_company(&self, id: i64, company: &CompanyPayload) -> Result<Company> {
        self.put_json(&format!("/companies/{}", id), company).await
    }

    pub async fn delete_company(&self, id: i64) -> Result<()> {
        self.delete_resource(&format!("/companies/{}", id)).await
    }

    // =========================================================================
    // Contacts
    // =========================================================================

    pub async fn list_contacts(&self) -> Result<Vec<Contact>> {
        self.get_json("/contacts").await
    }

    pub async fn get_contact(&self, id: i64) -> Result<Contact> {
        self.get_json(&format!("/contacts/{}", id)).await
    }

    pub async fn create_contact(&self, contact: &ContactPayload) -> Result<Contact> {
        self.post_json("/contacts", contact).await
    }

    pub async fn update_contact(&self, id: i64, contact: &ContactPayload) -> Result<Contact> {
        self.put_json(&format!("/contacts/{}", id), contact).await
    }

    pub async fn delete_contact(&self, id: i64) -> Result<()> {
        self.delete_resource(&format!("/contacts/{}", id)).await
    }

    // =========================================================================
    // Leads
    // =========================================================================

    pub async fn list_leads(&self) -> Result<Vec<Lead>> {
        self.get_json("/leads").await
    }

    pub async fn get_lead(&self, id: i64) -> Result<Lead> {
        self.get_json(&format!("/leads/{}", id)).await
    }

    pub async fn create_lead(&self, lead: &LeadPayload) -> Result<Lead> {
        self.post_json("/leads", lead).await
    }

    pub async fn update_lead(&self, id: i64, lead: &LeadPayload) -> Result<Lead> {
        self.put_json(&format!("/leads/{}", id), lead).await
    }

    pub async fn delete_lead(&self, id: i64) -> Result<()> {
        self.delete_resource(&format!("/leads/{}", id)).await
    }

    // =========================================================================
    // Deals
    // =========================================================================

    pub async fn list_deals(&self) -> Result<Vec<Deal>> {
        self.get_json("/deals").await
    }

    pub async fn get_deal(&self, id: i64) -> Result<Deal> {
        self.get_json(&format!("/deals/{}", id)).await
    }

    pub async fn create_deal(&self, deal: &DealPayload) -> Result<Deal> {
        self.post_json("/deals", deal).await
    }

    pub async fn update_deal(&self, id: i64, deal: &DealPayload) -> Result<Deal> {
        self.put_json(&format!("/deals/{}", id), deal).await
    }

    pub async fn delete_deal(&self, id: i64) -> Result<()> {
        self.delete_resource(&format!("/deals/{}", id)).await
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// List all users. The server restricts this to admins.
    pub async fn list_users(&self) -> Result<Vec<User>> {
        self.get_json("/users").await
    }

    pub async fn get_user(&self, id: i64) -> Result<User> {
        self.get_json(&format!("/users/{}", id)).await
    }

    pub async fn current_user(&self) -> Result<User> {
        self.get_json("/users/me").await
    }

    /// Update a user record; used for the signed-in user's own profile.
    /// Admins may update anyone.
    pub async fn update_user(&self, id: i64, update: &UserUpdate) -> Result<User> {
        self.put_json(&format!("/users/{}", id), update).await
    }

    pub async fn promote_user(&self, id: i64) -> Result<User> {
        self.post_empty(&format!("/users/promote/{}", id)).await
    }

    pub async fn disable_user(&self, id: i64) -> Result<User> {
        self.post_empty(&format!("/users/disable/{}", id)).await
    }

    pub async fn enable_user(&self, id: i64) -> Result<User> {
        self.post_empty(&format!("/users/enable/{}", id)).await
    }

    // =========================================================================
    // Gong integration
    // =========================================================================

    /// Register this CRM with Gong. The integration payload lives
    /// server-side; this only pulls the trigger.
    pub async fn register_gong_integration(&self) -> Result<IntegrationResponse> {
        self.post_empty("/gong/register_integration").await
    }

    /// Re-publish the CRM schema to Gong
    pub async fn update_gong_schema(&self) -> Result<MessageResponse> {
        self.post_empty("/gong/update_schema").await
    }

    /// Push a full dump of the CRM database to Gong
    pub async fn push_to_gong(&self) -> Result<MessageResponse> {
        self.post_empty("/gong/full_db_dump").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_integration_responses() {
        let message: MessageResponse =
            serde_json::from_str(r#"{"message": "Full database dump completed successfully."}"#)
                .expect("Failed to parse message response");
        assert_eq!(message.message, "Full database dump completed successfully.");

        let integration: IntegrationResponse =
            serde_json::from_str(r#"{"integration_id": "12345"}"#)
                .expect("Failed to parse integration response");
        assert_eq!(integration.integration_id, "12345");
    }
}
