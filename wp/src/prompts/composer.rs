//! Prompt composition
//!
//! Turns a validated request into the (system, user) prompt pair. Templates
//! are compiled once in [`PromptComposer::new`]; `compose` is pure and
//! byte-for-byte reproducible for the same request.

use std::path::Path;

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::PromptLoader;
use crate::error::GenerationError;
use crate::request::{EquipmentAccess, ExperienceLevel, FitnessGoal, PlanRequest, ValidatedRequest, Weekday};

/// Exercise count per training day that the system prompt asks for
pub const MIN_EXERCISES: usize = 3;
pub const MAX_EXERCISES: usize = 4;

const SYSTEM_TEMPLATE: &str = "system";
const USER_TEMPLATE: &str = "user";

const NO_LIMITATIONS: &str = "None specified";
const NO_NOTES: &str = "None";

/// The two instructions sent to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PromptPair {
    pub system: String,
    pub user: String,
}

#[derive(Serialize)]
struct SystemContext {
    min_exercises: usize,
    max_exercises: usize,
}

#[derive(Serialize)]
struct UserContext<'a> {
    fitness_goal: &'a str,
    experience_level: &'a str,
    workout_days_per_week: u8,
    workout_duration: u32,
    available_days: String,
    preferred_workout_types: String,
    equipment_access: &'a str,
    limitations: &'a str,
    additional_notes: &'a str,
}

impl<'a> UserContext<'a> {
    fn from_request(request: &'a PlanRequest) -> Self {
        Self {
            fitness_goal: request.fitness_goal.as_str(),
            experience_level: request.experience_level.as_str(),
            workout_days_per_week: request.workout_days_per_week,
            workout_duration: request.workout_duration,
            available_days: request
                .available_days
                .iter()
                .map(Weekday::as_str)
                .collect::<Vec<_>>()
                .join(", "),
            preferred_workout_types: request.preferred_workout_types.join(", "),
            equipment_access: request.equipment_access.as_str(),
            limitations: request.limitations.as_deref().unwrap_or(NO_LIMITATIONS),
            additional_notes: request.additional_notes.as_deref().unwrap_or(NO_NOTES),
        }
    }
}

/// Renders prompt pairs from compiled templates
pub struct PromptComposer {
    hbs: Handlebars<'static>,
}

impl PromptComposer {
    /// Compile the embedded templates
    pub fn new() -> Result<Self> {
        Self::with_loader(&PromptLoader::embedded_only())
    }

    /// Compile templates, preferring overrides in `dir`
    pub fn from_dir(dir: Option<&Path>) -> Result<Self> {
        Self::with_loader(&PromptLoader::new(dir))
    }

    /// Compile templates resolved by `loader`
    ///
    /// Both templates are test-rendered against a sample request in strict
    /// mode, so a template naming an unknown variable fails here rather than
    /// on a live request.
    pub fn with_loader(loader: &PromptLoader) -> Result<Self> {
        debug!("PromptComposer::with_loader: called");
        let mut hbs = Handlebars::new();
        hbs.set_strict_mode(true);
        hbs.register_escape_fn(handlebars::no_escape);

        for name in [SYSTEM_TEMPLATE, USER_TEMPLATE] {
            let source = loader.load_template(name)?;
            hbs.register_template_string(name, source)
                .map_err(|e| eyre!("Failed to compile prompt template '{}': {}", name, e))?;
        }

        let composer = Self { hbs };
        let probe = probe_request().map_err(|e| eyre!("Invalid probe request: {}", e))?;
        composer
            .compose(&probe)
            .map_err(|e| eyre!("Prompt templates failed a test render: {}", e))?;
        Ok(composer)
    }

    /// Render the prompt pair for a validated request
    pub fn compose(&self, request: &ValidatedRequest) -> Result<PromptPair, GenerationError> {
        debug!(goal = request.fitness_goal.as_str(), "PromptComposer::compose: called");
        let system = self.render(
            SYSTEM_TEMPLATE,
            &SystemContext {
                min_exercises: MIN_EXERCISES,
                max_exercises: MAX_EXERCISES,
            },
        )?;
        let user = self.render(USER_TEMPLATE, &UserContext::from_request(request.request()))?;
        debug!(
            system_len = system.len(),
            user_len = user.len(),
            "PromptComposer::compose: rendered"
        );
        Ok(PromptPair { system, user })
    }

    fn render<T: Serialize>(&self, name: &str, context: &T) -> Result<String, GenerationError> {
        self.hbs
            .render(name, context)
            .map(|text| text.trim_end().to_string())
            .map_err(|e| GenerationError::PromptTemplate {
                message: format!("Failed to render template {}: {}", name, e),
            })
    }
}

fn probe_request() -> Result<ValidatedRequest, GenerationError> {
    let request = PlanRequest {
        fitness_goal: FitnessGoal::GeneralFitness,
        experience_level: ExperienceLevel::Beginner,
        workout_days_per_week: 3,
        workout_duration: 30,
        available_days: vec![Weekday::Mon, Weekday::Wed, Weekday::Fri],
        preferred_workout_types: vec!["strength".to_string()],
        equipment_access: EquipmentAccess::None,
        limitations: None,
        additional_notes: None,
    };
    ValidatedRequest::try_from(request)
}
