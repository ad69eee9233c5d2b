pub mod factory;
pub mod types;

pub use types::{
    CardioBlock, Exercise, PlanError, RestTime, Rir, Rpe, Series, WorkoutDay, WorkoutPlan,
    WorkoutWeek,
};
