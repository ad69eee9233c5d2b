///! Plan factory - builds plans, weeks, days and exercises with editor defaults

use chrono::Utc;
use uuid::Uuid;

use crate::types::{
    CardioBlock, Exercise, RestTime, Rir, Rpe, Series, WorkoutDay, WorkoutPlan, WorkoutWeek,
};

pub const DEFAULT_PLAN_TITLE: &str = "Plan de Entrenamiento";
pub const DEFAULT_CARDIO_NOTE: &str =
    "No te saltes el cardio, es un complemento importante para tu proceso.";
pub const DEFAULT_DAYS_PER_WEEK: usize = 5;

fn generate_id() -> String {
    Uuid::now_v7().to_string()
}

/// Cardio block every new day starts with
pub fn default_cardio() -> CardioBlock {
    CardioBlock {
        description: String::new(),
        note: DEFAULT_CARDIO_NOTE.to_string(),
    }
}

/// Create an exercise with the editor defaults (3 x 10, 2 MIN rest, RIR 2, RPE 8)
pub fn create_exercise(name: impl Into<String>) -> Exercise {
    Exercise {
        id: generate_id(),
        name: name.into(),
        series: Series::clamped(3),
        reps: 10,
        rest_time: RestTime::TwoMin,
        rir: Rir::clamped(2),
        rpe: Rpe::clamped(8),
    }
}

/// Create day `day_number` with a single blank exercise
pub fn create_workout_day(day_number: u32) -> WorkoutDay {
    WorkoutDay {
        id: generate_id(),
        day_number,
        day_label: WorkoutDay::label_for(day_number),
        muscle_group: String::new(),
        exercises: vec![create_exercise("")],
        cardio: default_cardio(),
    }
}

pub fn create_workout_week(week_number: u32, days_count: usize) -> WorkoutWeek {
    WorkoutWeek {
        id: generate_id(),
        week_number,
        days: (1..=days_count as u32).map(create_workout_day).collect(),
    }
}

pub fn create_workout_plan(weeks_count: usize, days_per_week: usize) -> WorkoutPlan {
    WorkoutPlan {
        id: generate_id(),
        title: DEFAULT_PLAN_TITLE.to_string(),
        weeks: (1..=weeks_count as u32)
            .map(|week_number| create_workout_week(week_number, days_per_week))
            .collect(),
        created_at: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_exercise_defaults() {
        let exercise = create_exercise("Sentadilla");
        assert_eq!(exercise.name, "Sentadilla");
        assert_eq!(exercise.series.value(), 3);
        assert_eq!(exercise.reps, 10);
        assert_eq!(exercise.rest_time, RestTime::TwoMin);
        assert_eq!(exercise.rir.value(), 2);
        assert_eq!(exercise.rpe.value(), 8);
    }

    #[test]
    fn test_create_workout_day() {
        let day = create_workout_day(3);
        assert_eq!(day.day_number, 3);
        assert_eq!(day.day_label, "Dia 3");
        assert_eq!(day.exercises.len(), 1);
        assert_eq!(day.cardio.note, DEFAULT_CARDIO_NOTE);
        assert!(day.cardio.description.is_empty());
    }

    #[test]
    fn test_create_workout_plan_numbering() {
        let plan = create_workout_plan(2, DEFAULT_DAYS_PER_WEEK);
        assert_eq!(plan.title, DEFAULT_PLAN_TITLE);
        assert_eq!(plan.weeks.len(), 2);
        assert_eq!(plan.day_count(), 10);

        for (i, week) in plan.weeks.iter().enumerate() {
            assert_eq!(week.week_number, i as u32 + 1);
            let numbers: Vec<u32> = week.days.iter().map(|d| d.day_number).collect();
            assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
        }
        assert!(plan.validate().is_ok());
    }

    #[test]
    fn test_ids_are_unique() {
        let plan = create_workout_plan(1, 3);
        let mut ids: Vec<&str> = plan.weeks[0].days.iter().map(|d| d.id.as_str()).collect();
        ids.push(&plan.id);
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
    }
}
