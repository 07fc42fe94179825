use serde::{Deserialize, Serialize};

/// Industry classification, mirroring the server's enum one-to-one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Industry {
    Agriculture,
    Apparel,
    Banking,
    Biotechnology,
    Chemical,
    Communications,
    Construction,
    Consulting,
    Education,
    Electronics,
    Energy,
    Engineering,
    Entertainment,
    Environmental,
    Finance,
    FoodBeverage,
    Government,
    Healthcare,
    Hospitality,
    Insurance,
    Machinery,
    Manufacturing,
    Media,
    NotForProfit,
    Recreation,
    Retail,
    Shipping,
    Technology,
    Telecommunications,
    Transportation,
    Utilities,
}

impl Industry {
    /// Wire value, as it appears in JSON and in URL path segments.
    pub fn as_str(&self) -> &'static str {
        match self {
            Industry::Agriculture => "agriculture",
            Industry::Apparel => "apparel",
            Industry::Banking => "banking",
            Industry::Biotechnology => "biotechnology",
            Industry::Chemical => "chemical",
            Industry::Communications => "communications",
            Industry::Construction => "construction",
            Industry::Consulting => "consulting",
            Industry::Education => "education",
            Industry::Electronics => "electronics",
            Industry::Energy => "energy",
            Industry::Engineering => "engineering",
            Industry::Entertainment => "entertainment",
            Industry::Environmental => "environmental",
            Industry::Finance => "finance",
            Industry::FoodBeverage => "food_beverage",
            Industry::Government => "government",
            Industry::Healthcare => "healthcare",
            Industry::Hospitality => "hospitality",
            Industry::Insurance => "insurance",
            Industry::Machinery => "machinery",
            Industry::Manufacturing => "manufacturing",
            Industry::Media => "media",
            Industry::NotForProfit => "not_for_profit",
            Industry::Recreation => "recreation",
            Industry::Retail => "retail",
            Industry::Shipping => "shipping",
            Industry::Technology => "technology",
            Industry::Telecommunications => "telecommunications",
            Industry::Transportation => "transportation",
            Industry::Utilities => "utilities",
        }
    }
}

impl std::fmt::Display for Industry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Domain {
    pub id: i64,
    pub name: String,
    pub company_id: Option<i64>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: i64,
    pub name: String,
    pub industry: Industry,
    #[serde(default)]
    pub domains: Vec<Domain>,
    pub created_at: String,
    pub updated_at: String,
}

impl Company {
    /// Comma-separated domain names for list rendering
    pub fn domain_names(&self) -> String {
        self.domains
            .iter()
            .map(|domain| domain.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Create/update payload. Domains are sent by name; the server rebuilds the
/// domain rows on update.
#[derive(Debug, Clone, Serialize)]
pub struct CompanyPayload {
    pub name: String,
    pub industry: Industry,
    pub domains: Vec<DomainPayload>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DomainPayload {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
}
