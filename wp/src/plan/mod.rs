//! Workout plan document and parser

mod parser;
mod types;

pub use parser::{parse, parse_value};
pub use types::{
    Day, Exercise, Metadata, Nutrition, Overview, Phase, PlanSummary, Progression, Reps, RestDay, TrainingDay, Week,
    WorkoutPlan, WorkoutPlanDocument,
};
