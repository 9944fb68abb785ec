//! Agent persona identifiers.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed set of verification personas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentId {
    GeneralPurpose,
    IdDocumentVerifier,
    ProductAuthenticator,
    TextAnalyzer,
    PharmaceuticalAuthenticator,
    DrinkAuthenticator,
    FoodAuthenticator,
    WaterAuthenticator,
}

impl AgentId {
    /// All identifiers in catalog order.
    pub const ALL: [AgentId; 8] = [
        AgentId::GeneralPurpose,
        AgentId::IdDocumentVerifier,
        AgentId::ProductAuthenticator,
        AgentId::TextAnalyzer,
        AgentId::PharmaceuticalAuthenticator,
        AgentId::DrinkAuthenticator,
        AgentId::FoodAuthenticator,
        AgentId::WaterAuthenticator,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AgentId::GeneralPurpose => "general_purpose",
            AgentId::IdDocumentVerifier => "id_document_verifier",
            AgentId::ProductAuthenticator => "product_authenticator",
            AgentId::TextAnalyzer => "text_analyzer",
            AgentId::PharmaceuticalAuthenticator => "pharmaceutical_authenticator",
            AgentId::DrinkAuthenticator => "drink_authenticator",
            AgentId::FoodAuthenticator => "food_authenticator",
            AgentId::WaterAuthenticator => "water_authenticator",
        }
    }

    /// Parse a wire identifier. Matching is exact; unknown ids return None.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|id| id.as_str() == s)
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
