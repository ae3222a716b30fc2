//! Generation orchestrator
//!
//! Runs one plan generation: validate -> compose -> call -> parse. A
//! [`PlanGenerator`] holds no per-call state and is shared across tasks
//! behind an `Arc`.

use std::sync::Arc;

use eyre::{Context, Result};
use serde_json::Value;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::error::GenerationError;
use crate::llm::{ChatProvider, ClientOptions, ModelClient, create_provider, to_generation_error};
use crate::plan::{self, WorkoutPlanDocument};
use crate::prompts::{PromptComposer, PromptPair};
use crate::request::{self, ValidatedRequest};

/// Turns plan requests into validated workout plans
pub struct PlanGenerator {
    composer: PromptComposer,
    client: ModelClient,
    limiter: Option<Arc<Semaphore>>,
}

impl PlanGenerator {
    pub fn new(composer: PromptComposer, client: ModelClient) -> Self {
        debug!("PlanGenerator::new: called");
        Self {
            composer,
            client,
            limiter: None,
        }
    }

    /// Share a provider-call limiter with other generators
    pub fn with_limiter(mut self, limiter: Arc<Semaphore>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    /// Build a generator from configuration using the configured provider
    pub fn from_config(config: &Config) -> Result<Self> {
        debug!(provider = %config.llm.provider, "from_config: called");
        let provider = create_provider(&config.llm).context("Failed to create LLM provider")?;
        Self::from_config_with_provider(config, provider)
    }

    /// Build a generator from configuration with an explicit provider
    pub fn from_config_with_provider(config: &Config, provider: Arc<dyn ChatProvider>) -> Result<Self> {
        let composer = PromptComposer::from_dir(config.prompts.expanded_dir().as_deref())
            .context("Failed to load prompt templates")?;
        let client = ModelClient::new(provider, ClientOptions::from_config(&config.llm, &config.retry));
        let generator = Self::new(composer, client);

        match config.concurrency.max_provider_calls {
            0 => Ok(generator),
            n => {
                debug!(max_provider_calls = n, "from_config_with_provider: limiting provider calls");
                Ok(generator.with_limiter(Arc::new(Semaphore::new(n as usize))))
            }
        }
    }

    pub fn composer(&self) -> &PromptComposer {
        &self.composer
    }

    /// Validate a raw request and generate a plan for it
    pub async fn generate(&self, raw: &Value) -> Result<WorkoutPlanDocument, GenerationError> {
        debug!("generate: called");
        let request = request::validate(raw).inspect_err(|e| {
            info!(error = %e, "Rejected plan request");
        })?;
        self.generate_validated(&request).await
    }

    /// Generate a plan for an already-validated request
    pub async fn generate_validated(&self, request: &ValidatedRequest) -> Result<WorkoutPlanDocument, GenerationError> {
        let id = Uuid::now_v7();
        let span = info_span!(
            "generation",
            %id,
            goal = request.fitness_goal.as_str(),
            level = request.experience_level.as_str()
        );
        self.run(request).instrument(span).await
    }

    /// Build the prompt pair without calling the provider
    pub fn prompt_for(&self, request: &ValidatedRequest) -> Result<PromptPair, GenerationError> {
        self.composer.compose(request)
    }

    async fn run(&self, request: &ValidatedRequest) -> Result<WorkoutPlanDocument, GenerationError> {
        let prompt = self.composer.compose(request).inspect_err(|e| {
            error!(error = %e, "Prompt rendering failed");
        })?;
        debug!(
            system_len = prompt.system.len(),
            user_len = prompt.user.len(),
            "run: prompt composed"
        );

        let raw = self.call_limited(&prompt).await?;

        let document = plan::parse(&raw).inspect_err(|e| match e {
            GenerationError::SchemaViolation { path, message } => {
                warn!(%path, %message, raw_len = raw.len(), "Plan failed structural validation");
            }
            other => {
                warn!(error = %other, raw_len = raw.len(), "Plan reply was not usable JSON");
            }
        })?;

        let summary = document.summary();
        info!(
            weeks = summary.weeks,
            training_days = summary.training_days,
            rest_days = summary.rest_days,
            exercises = summary.exercises,
            "Generated workout plan"
        );
        Ok(document)
    }

    async fn call_limited(&self, prompt: &PromptPair) -> Result<String, GenerationError> {
        let _permit = match &self.limiter {
            Some(limiter) => {
                debug!(available = limiter.available_permits(), "call_limited: waiting for permit");
                let permit = limiter
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|_| GenerationError::ProviderUnavailable {
                        message: "Provider call limiter is closed".to_string(),
                        status: None,
                    })?;
                Some(permit)
            }
            None => None,
        };

        self.client.call(prompt).await.map_err(|failure| {
            let err = to_generation_error(&failure);
            match &err {
                GenerationError::ProviderAuthFailed { status, message } => {
                    error!(status, %message, "Provider rejected credentials");
                }
                other => {
                    warn!(attempts = failure.attempts(), error = %other, "Provider call failed");
                }
            }
            err
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::provider::mock::{Scripted, ScriptedProvider};
    use crate::llm::{ProviderReply, RetryPolicy};
    use serde_json::json;
    use std::time::Duration;

    fn request() -> Value {
        json!({
            "fitnessGoal": "strength",
            "experienceLevel": "beginner",
            "workoutDaysPerWeek": 3,
            "workoutDuration": 45,
            "availableDays": ["Mon", "Wed", "Fri"],
            "preferredWorkoutTypes": ["strength"],
            "equipmentAccess": "basic"
        })
    }

    fn plan_json() -> String {
        json!({
            "workoutPlan": {
                "metadata": {"name": "Plan", "goal": "strength", "fitnessLevel": "beginner",
                             "durationWeeks": 1, "createdAt": "2024-01-01"},
                "overview": {"description": "d", "weeklyStructure": "w", "equipmentNeeded": [], "sessionLength": 45},
                "schedule": [{"week": 1, "days": [{"day": "Sunday", "isRestDay": true}]}],
                "nutrition": {"generalGuidelines": "g", "proteinGoal": "p", "mealTiming": "m"},
                "progressionPlan": []
            }
        })
        .to_string()
    }

    fn generator(provider: &Arc<ScriptedProvider>) -> PlanGenerator {
        let options = ClientOptions {
            model: "test-model".to_string(),
            temperature: 0.7,
            max_tokens: 1000,
            timeout: Duration::from_millis(200),
            retry: RetryPolicy {
                max_attempts: 3,
                initial_backoff: Duration::from_millis(1),
                max_backoff: Duration::from_millis(2),
            },
        };
        PlanGenerator::new(
            PromptComposer::new().unwrap(),
            ModelClient::new(provider.clone(), options),
        )
    }

    #[tokio::test]
    async fn test_generate_success() {
        let provider = Arc::new(ScriptedProvider::always(Scripted::Reply(ProviderReply::ok(plan_json()))));
        let doc = generator(&provider).generate(&request()).await.unwrap();
        assert_eq!(doc.plan().metadata.name, "Plan");
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_request_never_calls_provider() {
        let provider = Arc::new(ScriptedProvider::always(Scripted::Reply(ProviderReply::ok(plan_json()))));
        let mut raw = request();
        raw.as_object_mut().unwrap().remove("equipmentAccess");
        let err = generator(&provider).generate(&raw).await.unwrap_err();
        assert_eq!(err, GenerationError::invalid("equipmentAccess", "field is required"));
        assert_eq!(provider.call_count(), 0);
    }

    #[tokio::test]
    async fn test_schema_violation_is_not_retried() {
        let provider = Arc::new(ScriptedProvider::always(Scripted::Reply(ProviderReply::ok(
            r#"{"workoutPlan": {}}"#,
        ))));
        let err = generator(&provider).generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::SchemaViolation { .. }));
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_auth_failure_maps_and_stops() {
        let provider = Arc::new(ScriptedProvider::always(Scripted::Reply(ProviderReply::status(
            401, "bad key",
        ))));
        let err = generator(&provider).generate(&request()).await.unwrap_err();
        assert!(matches!(err, GenerationError::ProviderAuthFailed { status: 401, .. }));
        assert_eq!(err.http_status(), 500);
        assert_eq!(provider.call_count(), 1);
    }

    #[tokio::test]
    async fn test_from_config_with_limiter() {
        let provider = Arc::new(ScriptedProvider::always(Scripted::Reply(ProviderReply::ok(plan_json()))));
        let mut config = Config::default();
        config.concurrency.max_provider_calls = 2;
        let generator = PlanGenerator::from_config_with_provider(&config, provider.clone()).unwrap();
        assert!(generator.limiter.is_some());
        assert!(generator.generate(&request()).await.is_ok());
        assert_eq!(generator.limiter.as_ref().unwrap().available_permits(), 2);
    }
}
