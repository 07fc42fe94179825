use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    New,
    Contacted,
    Qualified,
    Lost,
    Converted,
}

impl LeadStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::New => "new",
            LeadStatus::Contacted => "contacted",
            LeadStatus::Qualified => "qualified",
            LeadStatus::Lost => "lost",
            LeadStatus::Converted => "converted",
        }
    }
}

impl std::fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A potential customer not yet tied to a company record. The converted_*
/// fields link a lead to the entities it turned into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lead {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub details: Option<String>,
    pub status: LeadStatus,
    pub owner_id: i64,
    pub converted_to_deal_id: Option<i64>,
    pub converted_to_contact_id: Option<i64>,
    pub converted_to_company_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

impl Lead {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Create/update payload. The owner is required on create and is normally
/// the signed-in user's id.
#[derive(Debug, Clone, Serialize)]
pub struct LeadPayload {
    pub first_name: String,
    pub last_name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
    pub status: LeadStatus,
    pub owner_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_to_deal_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_to_contact_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub converted_to_company_id: Option<i64>,
}
