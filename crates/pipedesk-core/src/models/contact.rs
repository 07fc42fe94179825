use serde::{Deserialize, Serialize};

/// A person associated with a company in the CRM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company_id: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl Contact {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Create/update payload for contacts
#[derive(Debug, Clone, Serialize)]
pub struct ContactPayload {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub company_id: i64,
}
