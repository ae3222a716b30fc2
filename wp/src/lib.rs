//! workoutplan - LLM-backed workout plan generation
//!
//! Turns a user's training preferences into a structured, multi-week workout
//! plan. A request is validated, rendered into a system/user prompt pair, sent
//! to a chat-completion provider with bounded retries, and the reply is
//! accepted only if it matches the plan contract exactly.
//!
//! # Pipeline
//!
//! - **Validate**: [`request::validate`] checks required fields in a fixed order
//! - **Compose**: [`prompts::PromptComposer`] renders Handlebars templates
//! - **Call**: [`llm::ModelClient`] retries timeouts, 429 and 5xx with backoff
//! - **Parse**: [`plan::parse`] type-checks every field and reports a path
//!
//! # Modules
//!
//! - [`generator`] - End-to-end orchestration
//! - [`llm`] - Provider trait, OpenAI implementation, retry and classification
//! - [`error`] - Generation error taxonomy and HTTP mapping
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod error;
pub mod generator;
pub mod llm;
pub mod plan;
pub mod prompts;
pub mod request;

// Re-export commonly used types
pub use config::{Config, LlmConfig, RetryConfig};
pub use error::GenerationError;
pub use generator::PlanGenerator;
pub use llm::{
    CallFailure, ChatProvider, ChatRequest, ModelClient, OpenAiProvider, ProviderFailure, ProviderReply, RetryPolicy,
    create_provider,
};
pub use plan::{Day, WorkoutPlanDocument};
pub use prompts::{PromptComposer, PromptPair};
pub use request::{PlanRequest, ValidatedRequest, validate};
