//! Plan parser
//!
//! Turns raw model text into a [`WorkoutPlanDocument`]. Every field of the
//! contract is type-checked; the first violation is reported with a dotted
//! path rooted inside `workoutPlan`, e.g. `schedule[0].days[2].exercises`.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::types::*;
use crate::error::GenerationError;
use crate::prompts::MIN_EXERCISES;

const ROOT_KEY: &str = "workoutPlan";

/// Parse and structurally validate a model reply
pub fn parse(raw: &str) -> Result<WorkoutPlanDocument, GenerationError> {
    debug!(raw_len = raw.len(), "parse: called");
    let value: Value = serde_json::from_str(raw).map_err(|e| {
        debug!(error = %e, "parse: reply is not JSON");
        GenerationError::MalformedResponse {
            message: format!("Reply is not valid JSON: {}", e),
        }
    })?;
    parse_value(&value)
}

/// Structurally validate an already-decoded plan
pub fn parse_value(value: &Value) -> Result<WorkoutPlanDocument, GenerationError> {
    let plan = value
        .as_object()
        .and_then(|root| root.get(ROOT_KEY))
        .and_then(Value::as_object)
        .ok_or_else(|| GenerationError::schema(ROOT_KEY, "expected an object"))?;

    let plan = Object {
        map: plan,
        path: String::new(),
    };
    let document = WorkoutPlanDocument {
        workout_plan: workout_plan(&plan)?,
    };
    debug!(summary = ?document.summary(), "parse: accepted");
    Ok(document)
}

/// Sections are checked in document order so the first violation is the earliest one
fn workout_plan(obj: &Object) -> Result<WorkoutPlan, GenerationError> {
    let metadata = obj.object("metadata")?;
    let metadata = Metadata {
        name: metadata.string("name")?,
        goal: metadata.string("goal")?,
        fitness_level: metadata.string("fitnessLevel")?,
        duration_weeks: metadata.positive_int("durationWeeks")?,
        created_at: metadata.string("createdAt")?,
    };

    let overview = obj.object("overview")?;
    let overview = Overview {
        description: overview.string("description")?,
        weekly_structure: overview.string("weeklyStructure")?,
        equipment_needed: overview.string_list("equipmentNeeded")?,
        session_length: overview.positive_int("sessionLength")?,
    };

    let schedule = obj
        .non_empty_array("schedule")?
        .iter()
        .map(|item| week(&item.as_object()?))
        .collect::<Result<Vec<_>, _>>()?;

    let nutrition = obj.object("nutrition")?;
    let nutrition = Nutrition {
        general_guidelines: nutrition.string("generalGuidelines")?,
        protein_goal: nutrition.string("proteinGoal")?,
        meal_timing: nutrition.string("mealTiming")?,
    };

    let progression_plan = obj
        .array("progressionPlan")?
        .iter()
        .map(|item| {
            let entry = item.as_object()?;
            Ok(Progression {
                week: entry.positive_int("week")?,
                adjustments: entry.string("adjustments")?,
            })
        })
        .collect::<Result<Vec<_>, GenerationError>>()?;

    Ok(WorkoutPlan {
        metadata,
        overview,
        schedule,
        nutrition,
        progression_plan,
        additional_notes: obj.opt_string("additionalNotes")?,
    })
}

fn week(obj: &Object) -> Result<Week, GenerationError> {
    let week = obj.positive_int("week")?;
    let days = obj
        .non_empty_array("days")?
        .iter()
        .map(|item| day(&item.as_object()?))
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Week { week, days })
}

fn day(obj: &Object) -> Result<Day, GenerationError> {
    let name = obj.string("day")?;
    let is_rest_day = match obj.map.get("isRestDay") {
        None | Some(Value::Null) => None,
        Some(Value::Bool(flag)) => Some(*flag),
        Some(_) => return Err(obj.violation("isRestDay", "expected a boolean")),
    };

    if is_rest_day == Some(true) {
        return Ok(Day::Rest(RestDay {
            day: name,
            recommendations: obj.opt_string("recommendations")?,
        }));
    }

    let workout_type = obj.string("workoutType")?;
    let focus = obj.string("focus")?;
    let duration = obj.positive_int("duration")?;

    let exercises = obj
        .non_empty_array("exercises")?
        .iter()
        .map(|item| exercise(&item.as_object()?))
        .collect::<Result<Vec<_>, _>>()?;
    if exercises.len() < MIN_EXERCISES {
        warn!(
            path = %obj.path,
            day = %name,
            count = exercises.len(),
            "Training day has fewer exercises than requested"
        );
    }

    Ok(Day::Training(TrainingDay {
        day: name,
        is_rest_day,
        workout_type,
        focus,
        duration,
        exercises,
        warmup: phase(&obj.object("warmup")?)?,
        cooldown: phase(&obj.object("cooldown")?)?,
    }))
}

fn phase(obj: &Object) -> Result<Phase, GenerationError> {
    Ok(Phase {
        duration: obj.positive_int("duration")?,
        description: obj.string("description")?,
    })
}

fn exercise(obj: &Object) -> Result<Exercise, GenerationError> {
    let name = obj.string("name")?;
    let category = obj.string("category")?;
    let target_muscles = obj.string_list("targetMuscles")?;
    let sets = obj.positive_int("sets")?;
    let reps = match obj.map.get("reps") {
        Some(Value::Number(n)) => match n.as_u64().and_then(|v| u32::try_from(v).ok()) {
            Some(count) if count > 0 => Reps::Count(count),
            _ => return Err(obj.violation("reps", "expected a positive integer or a string")),
        },
        Some(Value::String(text)) if !text.trim().is_empty() => Reps::Text(text.clone()),
        Some(Value::String(_)) => return Err(obj.violation("reps", "must not be blank")),
        Some(_) => return Err(obj.violation("reps", "expected a positive integer or a string")),
        None => return Err(obj.violation("reps", "missing required field")),
    };

    Ok(Exercise {
        name,
        category,
        target_muscles,
        sets,
        reps,
        weight: obj.string("weight")?,
        rest_seconds: obj.int("restSeconds")?,
        notes: obj.opt_string("notes")?,
        alternatives: match obj.map.get("alternatives") {
            None | Some(Value::Null) => None,
            Some(_) => Some(obj.string_list("alternatives")?),
        },
    })
}

/// A JSON object plus the path that led to it
struct Object<'a> {
    map: &'a Map<String, Value>,
    path: String,
}

/// Any JSON value plus the path that led to it
struct Node<'a> {
    value: &'a Value,
    path: String,
}

impl Node<'_> {
    fn as_object(&self) -> Result<Object<'_>, GenerationError> {
        match self.value.as_object() {
            Some(map) => Ok(Object {
                map,
                path: self.path.clone(),
            }),
            None => Err(GenerationError::schema(&self.path, "expected an object")),
        }
    }
}

impl<'a> Object<'a> {
    fn child_path(&self, key: &str) -> String {
        if self.path.is_empty() {
            key.to_string()
        } else {
            format!("{}.{}", self.path, key)
        }
    }

    fn violation(&self, key: &str, message: &str) -> GenerationError {
        GenerationError::schema(self.child_path(key), message)
    }

    fn get(&self, key: &str) -> Result<&'a Value, GenerationError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Err(self.violation(key, "missing required field")),
            Some(value) => Ok(value),
        }
    }

    fn object(&self, key: &str) -> Result<Object<'a>, GenerationError> {
        match self.get(key)?.as_object() {
            Some(map) => Ok(Object {
                map,
                path: self.child_path(key),
            }),
            None => Err(self.violation(key, "expected an object")),
        }
    }

    fn string(&self, key: &str) -> Result<String, GenerationError> {
        match self.get(key)? {
            Value::String(s) => Ok(s.clone()),
            _ => Err(self.violation(key, "expected a string")),
        }
    }

    fn opt_string(&self, key: &str) -> Result<Option<String>, GenerationError> {
        match self.map.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(_) => Err(self.violation(key, "expected a string")),
        }
    }

    fn int(&self, key: &str) -> Result<u32, GenerationError> {
        self.get(key)?
            .as_u64()
            .and_then(|v| u32::try_from(v).ok())
            .ok_or_else(|| self.violation(key, "expected a non-negative integer"))
    }

    fn positive_int(&self, key: &str) -> Result<u32, GenerationError> {
        match self.get(key)?.as_u64().and_then(|v| u32::try_from(v).ok()) {
            Some(v) if v > 0 => Ok(v),
            _ => Err(self.violation(key, "expected a positive integer")),
        }
    }

    fn array(&self, key: &str) -> Result<Vec<Node<'a>>, GenerationError> {
        let base = self.child_path(key);
        match self.get(key)? {
            Value::Array(items) => Ok(items
                .iter()
                .enumerate()
                .map(|(i, value)| Node {
                    value,
                    path: format!("{}[{}]", base, i),
                })
                .collect()),
            _ => Err(self.violation(key, "expected an array")),
        }
    }

    fn non_empty_array(&self, key: &str) -> Result<Vec<Node<'a>>, GenerationError> {
        let items = self.array(key)?;
        if items.is_empty() {
            return Err(self.violation(key, "must not be empty"));
        }
        Ok(items)
    }

    fn string_list(&self, key: &str) -> Result<Vec<String>, GenerationError> {
        self.array(key)?
            .into_iter()
            .map(|node| match node.value {
                Value::String(s) => Ok(s.clone()),
                _ => Err(GenerationError::schema(&node.path, "expected a string")),
            })
            .collect()
    }
}
