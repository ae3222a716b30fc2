//! Typed workout plan document
//!
//! Built only by [`super::parse`]. Serializing a document reproduces the JSON
//! that was accepted, minus any keys the contract does not name.

use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};

/// Top-level envelope: `{"workoutPlan": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlanDocument {
    pub workout_plan: WorkoutPlan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlan {
    pub metadata: Metadata,
    pub overview: Overview,
    pub schedule: Vec<Week>,
    pub nutrition: Nutrition,
    pub progression_plan: Vec<Progression>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    pub name: String,
    pub goal: String,
    pub fitness_level: String,
    pub duration_weeks: u32,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overview {
    pub description: String,
    pub weekly_structure: String,
    pub equipment_needed: Vec<String>,
    pub session_length: u32,
}

/// One week of the schedule
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Week {
    pub week: u32,
    pub days: Vec<Day>,
}

/// A scheduled day: either a training session or a rest day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Day {
    Training(TrainingDay),
    Rest(RestDay),
}

impl Day {
    pub fn name(&self) -> &str {
        match self {
            Day::Training(day) => &day.day,
            Day::Rest(day) => &day.day,
        }
    }

    pub fn is_rest(&self) -> bool {
        matches!(self, Day::Rest(_))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrainingDay {
    pub day: String,
    /// Present only when the source carried an explicit `false`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_rest_day: Option<bool>,
    pub workout_type: String,
    pub focus: String,
    pub duration: u32,
    pub exercises: Vec<Exercise>,
    pub warmup: Phase,
    pub cooldown: Phase,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestDay {
    pub day: String,
    pub recommendations: Option<String>,
}

impl Serialize for RestDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let len = if self.recommendations.is_some() { 3 } else { 2 };
        let mut state = serializer.serialize_struct("RestDay", len)?;
        state.serialize_field("day", &self.day)?;
        state.serialize_field("isRestDay", &true)?;
        match &self.recommendations {
            Some(text) => state.serialize_field("recommendations", text)?,
            None => state.skip_field("recommendations")?,
        }
        state.end()
    }
}

/// Warmup or cooldown block
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Phase {
    pub duration: u32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub name: String,
    pub category: String,
    pub target_muscles: Vec<String>,
    pub sets: u32,
    pub reps: Reps,
    pub weight: String,
    pub rest_seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alternatives: Option<Vec<String>>,
}

/// Repetitions: a count, or free text such as "8-12" or "30 seconds"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Reps {
    Count(u32),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Nutrition {
    pub general_guidelines: String,
    pub protein_goal: String,
    pub meal_timing: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progression {
    pub week: u32,
    pub adjustments: String,
}

/// Counts used for CLI summaries and logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanSummary {
    pub weeks: usize,
    pub training_days: usize,
    pub rest_days: usize,
    pub exercises: usize,
}

impl WorkoutPlanDocument {
    pub fn plan(&self) -> &WorkoutPlan {
        &self.workout_plan
    }

    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary {
            weeks: self.workout_plan.schedule.len(),
            ..PlanSummary::default()
        };
        for day in self.workout_plan.schedule.iter().flat_map(|w| &w.days) {
            match day {
                Day::Training(training) => {
                    summary.training_days += 1;
                    summary.exercises += training.exercises.len();
                }
                Day::Rest(_) => summary.rest_days += 1,
            }
        }
        summary
    }

    /// Serialize back to the JSON contract
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
