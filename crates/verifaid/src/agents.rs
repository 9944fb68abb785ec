//! Built-in agent personas and their prompt templates.
//!
//! The catalog is constructed once at startup and shared read-only.

use serde::ser::{SerializeMap, SerializeStruct};
use serde::{Serialize, Serializer};
use tracing::debug;
use verifai_shared::AgentId;

/// Agent used when the request names no agent or an unknown one.
pub const FALLBACK_AGENT: AgentId = AgentId::GeneralPurpose;

/// A persona with its specialized prompt template.
///
/// Templates use `{object_class}` and `{input_type}` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentDescriptor {
    pub id: AgentId,
    pub description: &'static str,
    pub prompt_template: &'static str,
}

impl Serialize for AgentDescriptor {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("AgentDescriptor", 2)?;
        s.serialize_field("description", self.description)?;
        s.serialize_field("prompt_template", self.prompt_template)?;
        s.end()
    }
}

/// Immutable table of agent descriptors.
#[derive(Debug, Clone)]
pub struct AgentCatalog {
    agents: Vec<AgentDescriptor>,
}

impl AgentCatalog {
    /// The fixed catalog shipped with the gateway.
    pub fn builtin() -> Self {
        let agents = AgentId::ALL
            .iter()
            .map(|&id| {
                let (description, prompt_template) = builtin_entry(id);
                AgentDescriptor {
                    id,
                    description,
                    prompt_template,
                }
            })
            .collect();
        Self { agents }
    }

    pub fn get(&self, id: AgentId) -> Option<&AgentDescriptor> {
        self.agents.iter().find(|a| a.id == id)
    }

    /// Resolve a requested agent id, silently falling back to the
    /// general-purpose agent for absent or unknown ids.
    pub fn resolve(&self, requested: Option<&str>) -> &AgentDescriptor {
        let id = match requested.and_then(AgentId::parse) {
            Some(id) => id,
            None => {
                debug!(requested = ?requested, "Using fallback agent {}", FALLBACK_AGENT);
                FALLBACK_AGENT
            }
        };
        self.get(id)
            .or_else(|| self.get(FALLBACK_AGENT))
            .unwrap_or(&self.agents[0])
    }

    pub fn iter(&self) -> impl Iterator<Item = &AgentDescriptor> {
        self.agents.iter()
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

/// Serializes as an object keyed by agent id, in catalog order.
impl Serialize for AgentCatalog {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.agents.len()))?;
        for agent in &self.agents {
            map.serialize_entry(agent.id.as_str(), agent)?;
        }
        map.end()
    }
}

fn builtin_entry(id: AgentId) -> (&'static str, &'static str) {
    match id {
        AgentId::GeneralPurpose => (
            "A general-purpose agent for broad authenticity checks.",
            concat!(
                "Analyze this {input_type} of a {object_class}. ",
                "Determine if it appears authentic or counterfeit. ",
                "Provide a detailed explanation of your reasoning, highlighting specific features that support your conclusion. ",
                "Consider aspects like logos, stitching, material quality, and any visible serial numbers or tags. ",
                "If this is a document, perform OCR and analyze for signs of fraud or tampering. ",
                "If you cannot determine authenticity, state why. ",
            ),
        ),
        AgentId::IdDocumentVerifier => (
            "Specialized agent for verifying identity documents.",
            concat!(
                "Analyze this image of an ID document ({object_class}). ",
                "Perform OCR to extract all text. Verify the authenticity of the document, checking for signs of tampering, ",
                "forgery, or inconsistencies in fonts, holograms, and security features. ",
                "Crucially, also analyze for signs of spoofing or presentation attacks (e.g., image of a screen, printed photo, mask). ",
                "Provide a detailed explanation of any anomalies found, including spoofing attempts. ",
                "If you cannot determine authenticity, state why. ",
            ),
        ),
        AgentId::ProductAuthenticator => (
            "Specialized agent for authenticating physical products.",
            concat!(
                "Analyze this {input_type} of a {object_class} (product). ",
                "Focus on brand logos, serial numbers, material quality, stitching, and packaging. ",
                "Determine if it is an authentic product or a counterfeit. ",
                "Provide a detailed explanation of your findings and reasoning. ",
                "If you cannot determine authenticity, state why. ",
            ),
        ),
        AgentId::TextAnalyzer => (
            "Specialized agent for analyzing textual content.",
            concat!(
                "Analyze this text content related to a {object_class}. ",
                "Determine if it appears authentic, contains anomalies, or exhibits signs of AI generation/plagiarism. ",
                "Provide a detailed explanation of your reasoning, highlighting specific phrases or patterns. ",
                "If you cannot determine authenticity, state why. ",
            ),
        ),
        AgentId::PharmaceuticalAuthenticator => (
            "Specialized agent for authenticating pharmaceuticals.",
            concat!(
                "Analyze this {input_type} of a {object_class} (pharmaceutical product). ",
                "Focus on packaging, seals, batch numbers, expiry dates, holograms, and any visible security features. ",
                "Determine if it is an authentic product or a counterfeit. ",
                "Provide a detailed explanation of your findings and reasoning. ",
                "If you cannot determine authenticity, state why. ",
                "Crucially, highlight any potential health risks if deemed counterfeit or tampered. ",
                "Consider past verification results for similar items (if available for reinforcement learning).",
            ),
        ),
        AgentId::DrinkAuthenticator => (
            "Specialized agent for authenticating drinks, including alcohol and cognacs.",
            concat!(
                "Analyze this {input_type} of a {object_class} (drink/beverage). ",
                "Focus on bottle/can design, labels, seals, caps, liquid clarity, fill levels, and any unique identifiers. ",
                "Determine if it is an authentic product or a counterfeit. ",
                "Provide a detailed explanation of your findings and reasoning. ",
                "If you cannot determine authenticity, state why. ",
                "For alcoholic beverages, consider specific brand characteristics and regional authenticity markers. ",
                "Consider past verification results for similar items (if available for reinforcement learning).",
            ),
        ),
        AgentId::FoodAuthenticator => (
            "Specialized agent for authenticating food products.",
            concat!(
                "Analyze this {input_type} of a {object_class} (food product). ",
                "Focus on packaging integrity, seals, nutritional labels, expiry dates, ingredients list, and any visible signs of spoilage or tampering. ",
                "Determine if it is an authentic product, safe for consumption, or potentially counterfeit/compromised. ",
                "Provide a detailed explanation of your findings and reasoning. ",
                "If you cannot determine authenticity, state why. ",
                "Prioritize food safety and highlight any risks. ",
                "Consider past verification results for similar items (if available for reinforcement learning).",
            ),
        ),
        AgentId::WaterAuthenticator => (
            "Specialized agent for authenticating bottled water and other non-alcoholic beverages.",
            concat!(
                "Analyze this {input_type} of a {object_class} (bottled water or non-alcoholic beverage). ",
                "Focus on bottle design, cap seal, label authenticity, water clarity, and any unique identifiers. ",
                "Determine if it is an authentic product or a counterfeit. ",
                "Provide a detailed explanation of your findings and reasoning. ",
                "If you cannot determine authenticity, state why. ",
                "Highlight any signs of contamination or tampering. ",
                "Consider past verification results for similar items (if available for reinforcement learning).",
            ),
        ),
    }
}
