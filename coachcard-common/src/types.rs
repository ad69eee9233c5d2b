use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rest time between sets, matching the options offered by the plan editor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RestTime {
    #[serde(rename = "30 SEG")]
    ThirtySec,
    #[serde(rename = "1 MIN")]
    OneMin,
    #[serde(rename = "1-2 MIN")]
    OneTwoMin,
    #[serde(rename = "2 MIN")]
    TwoMin,
    #[serde(rename = "2-3 MIN")]
    TwoThreeMin,
    #[serde(rename = "3 MIN")]
    ThreeMin,
}

impl RestTime {
    pub const ALL: [RestTime; 6] = [
        RestTime::ThirtySec,
        RestTime::OneMin,
        RestTime::OneTwoMin,
        RestTime::TwoMin,
        RestTime::TwoThreeMin,
        RestTime::ThreeMin,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RestTime::ThirtySec => "30 SEG",
            RestTime::OneMin => "1 MIN",
            RestTime::OneTwoMin => "1-2 MIN",
            RestTime::TwoMin => "2 MIN",
            RestTime::TwoThreeMin => "2-3 MIN",
            RestTime::ThreeMin => "3 MIN",
        }
    }
}

impl std::fmt::Display for RestTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for RestTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RestTime::ALL
            .into_iter()
            .find(|rest| rest.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown rest time: {}", s))
    }
}

/// Declares a small integer scale that only accepts values in `MIN..=MAX`.
macro_rules! bounded_scale {
    ($(#[$meta:meta])* $name:ident, $min:expr, $max:expr) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "u8", into = "u8")]
        pub struct $name(u8);

        impl $name {
            pub const MIN: u8 = $min;
            pub const MAX: u8 = $max;

            /// Clamp `value` into range instead of rejecting it
            pub const fn clamped(value: u8) -> Self {
                if value < Self::MIN {
                    Self(Self::MIN)
                } else if value > Self::MAX {
                    Self(Self::MAX)
                } else {
                    Self(value)
                }
            }

            pub fn value(&self) -> u8 {
                self.0
            }
        }

        impl TryFrom<u8> for $name {
            type Error = String;

            fn try_from(value: u8) -> Result<Self, Self::Error> {
                if (Self::MIN..=Self::MAX).contains(&value) {
                    Ok(Self(value))
                } else {
                    Err(format!(
                        "{} must be between {} and {}, got {}",
                        stringify!($name),
                        Self::MIN,
                        Self::MAX,
                        value
                    ))
                }
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> u8 {
                value.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

bounded_scale!(
    /// Number of working sets
    Series, 1, 6
);
bounded_scale!(
    /// Reps in reserve
    Rir, 0, 5
);
bounded_scale!(
    /// Rate of perceived exertion
    Rpe, 1, 10
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub series: Series,
    /// Not range-checked: the editor limits it, the capture pipeline renders whatever it gets
    pub reps: i64,
    pub rest_time: RestTime,
    pub rir: Rir,
    pub rpe: Rpe,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardioBlock {
    pub description: String,
    pub note: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutDay {
    pub id: String,
    pub day_number: u32,
    pub day_label: String,
    pub muscle_group: String,
    pub exercises: Vec<Exercise>,
    pub cardio: CardioBlock,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutWeek {
    pub id: String,
    pub week_number: u32,
    pub days: Vec<WorkoutDay>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutPlan {
    pub id: String,
    pub title: String,
    pub weeks: Vec<WorkoutWeek>,
    pub created_at: DateTime<Utc>,
}

/// Structural problems that make a plan unusable for export
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    #[error("plan has no weeks")]
    NoWeeks,

    #[error("week {week_number} has {count} days, expected 1 to {max}", max = WorkoutWeek::MAX_DAYS)]
    DayCount { week_number: u32, count: usize },

    #[error("week {week_number}, day {day_number} has no exercises")]
    NoExercises { week_number: u32, day_number: u32 },
}

impl WorkoutWeek {
    pub const MAX_DAYS: usize = 7;
}

impl WorkoutDay {
    /// Label shown on the card, derived from the day number
    pub fn label_for(day_number: u32) -> String {
        format!("Dia {}", day_number)
    }
}

impl WorkoutPlan {
    /// Check the structural invariants the editor is expected to maintain.
    pub fn validate(&self) -> Result<(), PlanError> {
        if self.weeks.is_empty() {
            return Err(PlanError::NoWeeks);
        }

        for week in &self.weeks {
            if week.days.is_empty() || week.days.len() > WorkoutWeek::MAX_DAYS {
                return Err(PlanError::DayCount {
                    week_number: week.week_number,
                    count: week.days.len(),
                });
            }
            for day in &week.days {
                if day.exercises.is_empty() {
                    return Err(PlanError::NoExercises {
                        week_number: week.week_number,
                        day_number: day.day_number,
                    });
                }
            }
        }

        Ok(())
    }

    /// Total number of training days across all weeks
    pub fn day_count(&self) -> usize {
        self.weeks.iter().map(|week| week.days.len()).sum()
    }
}
