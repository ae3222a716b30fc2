//! Plan request types and preference validation
//!
//! The raw request arrives as loosely-typed JSON. [`validate`] checks it in a
//! fixed field order and returns a [`ValidatedRequest`], the only form the rest
//! of the pipeline accepts.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::GenerationError;

/// Required request fields, in the order they are checked
pub const REQUIRED_FIELDS: [&str; 7] = [
    "fitnessGoal",
    "experienceLevel",
    "workoutDaysPerWeek",
    "workoutDuration",
    "availableDays",
    "preferredWorkoutTypes",
    "equipmentAccess",
];

/// What the user is training for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FitnessGoal {
    WeightLoss,
    MuscleGain,
    Strength,
    Endurance,
    Flexibility,
    GeneralFitness,
}

impl FitnessGoal {
    pub const ALL: [Self; 6] = [
        Self::WeightLoss,
        Self::MuscleGain,
        Self::Strength,
        Self::Endurance,
        Self::Flexibility,
        Self::GeneralFitness,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WeightLoss => "weight_loss",
            Self::MuscleGain => "muscle_gain",
            Self::Strength => "strength",
            Self::Endurance => "endurance",
            Self::Flexibility => "flexibility",
            Self::GeneralFitness => "general_fitness",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.as_str() == s)
    }
}

/// Self-reported training experience
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl ExperienceLevel {
    pub const ALL: [Self; 3] = [Self::Beginner, Self::Intermediate, Self::Advanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|l| l.as_str() == s)
    }
}

/// Equipment the user can train with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentAccess {
    None,
    Basic,
    HomeGym,
    FullGym,
}

impl EquipmentAccess {
    pub const ALL: [Self; 4] = [Self::None, Self::Basic, Self::HomeGym, Self::FullGym];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Basic => "basic",
            Self::HomeGym => "home_gym",
            Self::FullGym => "full_gym",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.as_str() == s)
    }
}

/// Day of the week
///
/// Accepts short (`Mon`) and full (`Monday`) names case-insensitively and
/// always renders the short form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Weekday {
    Mon,
    Tue,
    Wed,
    Thu,
    Fri,
    Sat,
    Sun,
}

impl Weekday {
    pub const ALL: [Self; 7] = [
        Self::Mon,
        Self::Tue,
        Self::Wed,
        Self::Thu,
        Self::Fri,
        Self::Sat,
        Self::Sun,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mon => "Mon",
            Self::Tue => "Tue",
            Self::Wed => "Wed",
            Self::Thu => "Thu",
            Self::Fri => "Fri",
            Self::Sat => "Sat",
            Self::Sun => "Sun",
        }
    }

    pub fn full_name(&self) -> &'static str {
        match self {
            Self::Mon => "Monday",
            Self::Tue => "Tuesday",
            Self::Wed => "Wednesday",
            Self::Thu => "Thursday",
            Self::Fri => "Friday",
            Self::Sat => "Saturday",
            Self::Sun => "Sunday",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str().eq_ignore_ascii_case(s) || d.full_name().eq_ignore_ascii_case(s))
    }
}

impl fmt::Display for Weekday {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Workout plan preferences
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanRequest {
    pub fitness_goal: FitnessGoal,
    pub experience_level: ExperienceLevel,
    pub workout_days_per_week: u8,
    /// Session length in minutes
    pub workout_duration: u32,
    pub available_days: Vec<Weekday>,
    pub preferred_workout_types: Vec<String>,
    pub equipment_access: EquipmentAccess,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limitations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_notes: Option<String>,
}

/// A request that passed validation
///
/// Only [`validate`] and `TryFrom<PlanRequest>` construct one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRequest(PlanRequest);

impl ValidatedRequest {
    pub fn request(&self) -> &PlanRequest {
        &self.0
    }

    pub fn into_inner(self) -> PlanRequest {
        self.0
    }
}

impl std::ops::Deref for ValidatedRequest {
    type Target = PlanRequest;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<PlanRequest> for ValidatedRequest {
    type Error = GenerationError;

    fn try_from(request: PlanRequest) -> Result<Self, Self::Error> {
        debug!("ValidatedRequest::try_from: called");
        check_days_per_week(request.workout_days_per_week as u64)?;
        check_duration(request.workout_duration as u64)?;
        let available_days = dedup(request.available_days);
        if available_days.is_empty() {
            return Err(GenerationError::invalid("availableDays", "at least one day is required"));
        }
        let preferred_workout_types = clean_types(request.preferred_workout_types.iter().map(String::as_str))?;

        Ok(Self(PlanRequest {
            available_days,
            preferred_workout_types,
            limitations: clean_optional(request.limitations),
            additional_notes: clean_optional(request.additional_notes),
            ..request
        }))
    }
}

/// Validate a raw JSON request
///
/// Presence of every required field is checked first, in [`REQUIRED_FIELDS`]
/// order; the first missing one is reported. Values are then checked in the
/// same order.
pub fn validate(raw: &Value) -> Result<ValidatedRequest, GenerationError> {
    debug!("validate: called");
    let obj = raw
        .as_object()
        .ok_or_else(|| GenerationError::invalid("request", "expected a JSON object"))?;

    for field in REQUIRED_FIELDS {
        if matches!(obj.get(field), None | Some(Value::Null)) {
            debug!(%field, "validate: missing required field");
            return Err(GenerationError::invalid(field, "field is required"));
        }
    }

    let fitness_goal = parse_enum(obj, "fitnessGoal", FitnessGoal::parse, &FitnessGoal::ALL.map(|g| g.as_str()))?;
    let experience_level = parse_enum(
        obj,
        "experienceLevel",
        ExperienceLevel::parse,
        &ExperienceLevel::ALL.map(|l| l.as_str()),
    )?;

    let days = obj["workoutDaysPerWeek"]
        .as_u64()
        .ok_or_else(|| GenerationError::invalid("workoutDaysPerWeek", "expected an integer between 1 and 7"))?;
    check_days_per_week(days)?;

    let duration = obj["workoutDuration"]
        .as_u64()
        .ok_or_else(|| GenerationError::invalid("workoutDuration", "expected a positive integer (minutes)"))?;
    check_duration(duration)?;

    let available_days = parse_days(&obj["availableDays"])?;
    let preferred_workout_types = parse_types(&obj["preferredWorkoutTypes"])?;

    let equipment_access = parse_enum(
        obj,
        "equipmentAccess",
        EquipmentAccess::parse,
        &EquipmentAccess::ALL.map(|e| e.as_str()),
    )?;

    let limitations = optional_text(obj, "limitations")?;
    let additional_notes = optional_text(obj, "additionalNotes")?;

    debug!(goal = fitness_goal.as_str(), days, duration, "validate: request accepted");
    Ok(ValidatedRequest(PlanRequest {
        fitness_goal,
        experience_level,
        workout_days_per_week: days as u8,
        workout_duration: duration as u32,
        available_days,
        preferred_workout_types,
        equipment_access,
        limitations,
        additional_notes,
    }))
}

fn parse_enum<T>(
    obj: &Map<String, Value>,
    field: &str,
    parse: fn(&str) -> Option<T>,
    allowed: &[&str],
) -> Result<T, GenerationError> {
    let raw = obj[field]
        .as_str()
        .ok_or_else(|| GenerationError::invalid(field, "expected a string"))?;
    parse(raw).ok_or_else(|| {
        GenerationError::invalid(
            field,
            format!("unsupported value '{}'; expected one of: {}", raw, allowed.join(", ")),
        )
    })
}

fn check_days_per_week(days: u64) -> Result<(), GenerationError> {
    if (1..=7).contains(&days) {
        Ok(())
    } else {
        Err(GenerationError::invalid(
            "workoutDaysPerWeek",
            format!("{} is out of range; expected 1 to 7", days),
        ))
    }
}

fn check_duration(minutes: u64) -> Result<(), GenerationError> {
    if minutes == 0 || minutes > u32::MAX as u64 {
        return Err(GenerationError::invalid(
            "workoutDuration",
            "expected a positive integer (minutes)",
        ));
    }
    Ok(())
}

fn parse_days(value: &Value) -> Result<Vec<Weekday>, GenerationError> {
    let items = value
        .as_array()
        .ok_or_else(|| GenerationError::invalid("availableDays", "expected an array of weekday names"))?;
    let mut days = Vec::with_capacity(items.len());
    for item in items {
        let name = item
            .as_str()
            .ok_or_else(|| GenerationError::invalid("availableDays", "expected an array of weekday names"))?;
        let day = Weekday::parse(name)
            .ok_or_else(|| GenerationError::invalid("availableDays", format!("'{}' is not a weekday", name)))?;
        days.push(day);
    }
    let days = dedup(days);
    if days.is_empty() {
        return Err(GenerationError::invalid("availableDays", "at least one day is required"));
    }
    Ok(days)
}

fn parse_types(value: &Value) -> Result<Vec<String>, GenerationError> {
    let items = value
        .as_array()
        .ok_or_else(|| GenerationError::invalid("preferredWorkoutTypes", "expected an array of strings"))?;
    let names = items
        .iter()
        .map(|item| {
            item.as_str()
                .ok_or_else(|| GenerationError::invalid("preferredWorkoutTypes", "expected an array of strings"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    clean_types(names.into_iter())
}

fn clean_types<'a>(names: impl Iterator<Item = &'a str>) -> Result<Vec<String>, GenerationError> {
    let mut types = Vec::new();
    for name in names {
        let name = name.trim();
        if name.is_empty() {
            return Err(GenerationError::invalid(
                "preferredWorkoutTypes",
                "workout types must not be blank",
            ));
        }
        types.push(name.to_string());
    }
    let types = dedup(types);
    if types.is_empty() {
        return Err(GenerationError::invalid(
            "preferredWorkoutTypes",
            "at least one workout type is required",
        ));
    }
    Ok(types)
}

fn optional_text(obj: &Map<String, Value>, field: &str) -> Result<Option<String>, GenerationError> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(clean_optional(Some(s.clone()))),
        Some(_) => Err(GenerationError::invalid(field, "expected a string")),
    }
}

fn clean_optional(text: Option<String>) -> Option<String> {
    text.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Drop repeats, keeping first-seen order
fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}
