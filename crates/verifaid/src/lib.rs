//! VerifAI daemon library - exposes modules for testing.

pub mod agents;
pub mod config;
pub mod error;
pub mod gateway;
pub mod input;
pub mod model_client;
pub mod normalize;
pub mod prompts;
pub mod routes;
pub mod server;
pub mod table;

pub use agents::{AgentCatalog, AgentDescriptor};
pub use config::{Config, ModelConfig, ServerConfig};
pub use error::GatewayError;
pub use gateway::Gateway;
pub use model_client::{FakeModelClient, GeminiClient, ModelClient, ModelError, PromptPart};
pub use server::{router, AppState};
