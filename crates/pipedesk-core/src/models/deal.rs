use serde::{Deserialize, Serialize};

/// Pipeline stage for a deal, mirroring the server's enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStage {
    Prospecting,
    Qualification,
    NeedsAnalysis,
    ValueProposition,
    IdDecisionMakers,
    PerceptionAnalysis,
    ProposalPriceQuote,
    NegotiationReview,
    ClosedWon,
    ClosedLost,
}

impl DealStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealStage::Prospecting => "prospecting",
            DealStage::Qualification => "qualification",
            DealStage::NeedsAnalysis => "needs_analysis",
            DealStage::ValueProposition => "value_proposition",
            DealStage::IdDecisionMakers => "id_decision_makers",
            DealStage::PerceptionAnalysis => "perception_analysis",
            DealStage::ProposalPriceQuote => "proposal_price_quote",
            DealStage::NegotiationReview => "negotiation_review",
            DealStage::ClosedWon => "closed_won",
            DealStage::ClosedLost => "closed_lost",
        }
    }
}

impl std::fmt::Display for DealStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    Won,
    Lost,
    Open,
}

impl DealStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DealStatus::Won => "won",
            DealStatus::Lost => "lost",
            DealStatus::Open => "open",
        }
    }
}

impl std::fmt::Display for DealStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An opportunity or contract tied to a company.
/// Dates are carried as the server's ISO 8601 strings; nothing client-side
/// computes on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: i64,
    pub title: String,
    pub amount: i64,
    pub open_date: String,
    pub close_date: Option<String>,
    pub company_id: i64,
    pub owner_id: Option<i64>,
    pub stage: DealStage,
    pub description: Option<String>,
    pub status: DealStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// Create/update payload for deals
#[derive(Debug, Clone, Serialize)]
pub struct DealPayload {
    pub title: String,
    pub amount: i64,
    pub open_date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub close_date: Option<String>,
    pub company_id: i64,
    pub owner_id: i64,
    pub stage: DealStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: DealStatus,
}
