//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files into the system/user
//! prompt pair sent to the provider.
//!
//! Template loading chain:
//! 1. `{prompts.dir}/{name}.pmt` (operator override, when configured)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

mod composer;
pub mod embedded;
mod loader;

pub use composer::{MAX_EXERCISES, MIN_EXERCISES, PromptComposer, PromptPair};
pub use loader::PromptLoader;
