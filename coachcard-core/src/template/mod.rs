///! Workout day card template
///!
///! Turns a `WorkoutDay` into a `VisualNode`: a fully resolved, fixed-size card
///! that can be serialized to SVG (local rasterizer) or HTML/CSS (remote API).

pub mod color;
mod html;
mod svg;

use coachcard_common::{Exercise, WorkoutDay};

use crate::config::BrandingConfig;
pub use color::Rgb;

pub const DEFAULT_COACH_HANDLE: &str = "Pipetrainer_11";
pub const DEFAULT_ACCENT: Rgb = Rgb::new(0xcc, 0xff, 0x00);
pub const CARD_WIDTH: u32 = 1080;
pub const CARD_HEIGHT: u32 = 1920;

/// Per-render inputs that do not come from the day itself
#[derive(Debug, Clone, PartialEq)]
pub struct RenderContext {
    pub week_number: u32,
    pub coach_handle: Option<String>,
    pub accent_color: Option<String>,
    pub width: u32,
    pub height: u32,
}

impl RenderContext {
    pub fn new(week_number: u32) -> Self {
        Self {
            week_number,
            coach_handle: None,
            accent_color: None,
            width: CARD_WIDTH,
            height: CARD_HEIGHT,
        }
    }

    pub fn with_branding(mut self, branding: &BrandingConfig) -> Self {
        self.coach_handle = Some(branding.coach_handle.clone());
        self.accent_color = Some(branding.accent_color.clone());
        self
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }
}

/// One table row; every cell is already formatted for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExerciseRow {
    pub name: String,
    pub series: String,
    pub reps: String,
    pub rest_time: String,
    pub rir: String,
    pub rpe: String,
}

impl ExerciseRow {
    fn from_exercise(exercise: &Exercise) -> Self {
        Self {
            name: exercise.name.clone(),
            series: exercise.series.to_string(),
            reps: exercise.reps.to_string(),
            rest_time: exercise.rest_time.to_string(),
            rir: exercise.rir.to_string(),
            rpe: exercise.rpe.to_string(),
        }
    }

    pub fn cells(&self) -> [&str; 6] {
        [
            &self.name,
            &self.series,
            &self.reps,
            &self.rest_time,
            &self.rir,
            &self.rpe,
        ]
    }
}

/// A rendered workout day card, sized to the capture canvas
#[derive(Debug, Clone, PartialEq)]
pub struct VisualNode {
    pub width: u32,
    pub height: u32,
    pub week_number: u32,
    pub day_number: u32,
    pub day_label: String,
    pub muscle_group: String,
    pub rows: Vec<ExerciseRow>,
    pub cardio_description: String,
    pub cardio_note: String,
    pub coach_handle: String,
    pub accent: Rgb,
}

pub const TABLE_HEADERS: [&str; 6] = ["EJERCICIOS", "SERIES", "REPS", "TIEMPO DESCANSO", "RIR", "RPE"];

/// Render `day` into a card. Pure: the same inputs always give the same node.
pub fn render(day: &WorkoutDay, context: &RenderContext) -> VisualNode {
    let coach_handle = context
        .coach_handle
        .as_deref()
        .filter(|handle| !handle.trim().is_empty())
        .unwrap_or(DEFAULT_COACH_HANDLE)
        .to_string();

    let accent = match context.accent_color.as_deref() {
        Some(value) => Rgb::parse_or(value, DEFAULT_ACCENT),
        None => DEFAULT_ACCENT,
    };

    VisualNode {
        width: context.width,
        height: context.height,
        week_number: context.week_number,
        day_number: day.day_number,
        day_label: day.day_label.clone(),
        muscle_group: day.muscle_group.clone(),
        rows: day.exercises.iter().map(ExerciseRow::from_exercise).collect(),
        cardio_description: day.cardio.description.clone(),
        cardio_note: day.cardio.note.clone(),
        coach_handle,
        accent,
    }
}

impl VisualNode {
    pub fn exercise_row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn week_title(&self) -> String {
        format!("SEMANA {}", self.week_number)
    }

    /// All text shown on the card, in reading order
    pub fn text_content(&self) -> Vec<String> {
        let mut texts = vec![
            "PT".to_string(),
            "PLAN DE ENTRENAMIENTO".to_string(),
            self.week_title(),
            self.day_label.clone(),
            self.muscle_group.to_uppercase(),
        ];
        texts.extend(TABLE_HEADERS.iter().map(|h| h.to_string()));
        for row in &self.rows {
            texts.extend(row.cells().iter().map(|cell| cell.to_string()));
        }
        texts.push("CARDIO".to_string());
        texts.push(self.cardio_description.clone());
        texts.push(format!("NOTA: {}", self.cardio_note));
        texts.push(self.coach_handle.clone());
        texts
    }

    /// SVG document for the local rasterizer
    pub fn to_svg(&self) -> String {
        svg::build_card_svg(self)
    }

    /// HTML body for the remote rendering API
    pub fn to_html(&self) -> String {
        html::build_card_html(self)
    }

    /// Stylesheet sent alongside `to_html`
    pub fn stylesheet(&self) -> &'static str {
        html::CARD_CSS
    }
}

pub(crate) fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use coachcard_common::factory::{create_exercise, create_workout_day};
    use coachcard_common::{RestTime, Rir, Rpe, Series};

    fn sample_day() -> WorkoutDay {
        let mut day = create_workout_day(2);
        day.muscle_group = "Espalda".to_string();
        day.exercises = vec![
            create_exercise("Dominadas"),
            Exercise {
                series: Series::clamped(5),
                reps: 12,
                rest_time: RestTime::OneTwoMin,
                rir: Rir::clamped(0),
                rpe: Rpe::clamped(10),
                ..create_exercise("Remo con barra")
            },
            create_exercise("Face pull"),
        ];
        day.cardio.description = "25 min bici".to_string();
        day
    }

    #[test]
    fn test_render_is_deterministic() {
        let day = sample_day();
        let context = RenderContext::new(3);

        let first = render(&day, &context);
        let second = render(&day, &context);

        assert_eq!(first, second);
        assert_eq!(first.text_content(), second.text_content());
        assert_eq!(first.to_svg(), second.to_svg());
        assert_eq!(first.to_html(), second.to_html());
        assert_eq!(first.exercise_row_count(), day.exercises.len());
    }

    #[test]
    fn test_all_exercise_fields_present() {
        let day = sample_day();
        let node = render(&day, &RenderContext::new(1));
        let texts = node.text_content();

        for exercise in &day.exercises {
            assert!(texts.contains(&exercise.name));
        }
        let row = &node.rows[1];
        assert_eq!(row.cells(), ["Remo con barra", "5", "12", "1-2 MIN", "0", "10"]);
        assert!(texts.contains(&"SEMANA 1".to_string()));
        assert!(texts.contains(&"ESPALDA".to_string()));
        assert!(texts.contains(&"25 min bici".to_string()));
    }

    #[test]
    fn test_any_rep_count_is_tolerated() {
        let mut day = sample_day();
        day.exercises[0].reps = -4;
        day.exercises[1].reps = 250;
        let node = render(&day, &RenderContext::new(1));
        assert_eq!(node.rows[0].reps, "-4");
        assert_eq!(node.rows[1].reps, "250");
    }

    #[test]
    fn test_branding_defaults_and_overrides() {
        let day = sample_day();

        let node = render(&day, &RenderContext::new(1));
        assert_eq!(node.coach_handle, DEFAULT_COACH_HANDLE);
        assert_eq!(node.accent, DEFAULT_ACCENT);
        assert_eq!((node.width, node.height), (1080, 1920));

        let branding = BrandingConfig {
            brand_name: "Coach".to_string(),
            coach_handle: "@coach".to_string(),
            accent_color: "#DBFE53".to_string(),
        };
        let node = render(
            &day,
            &RenderContext::new(1).with_branding(&branding).with_size(540, 960),
        );
        assert_eq!(node.coach_handle, "@coach");
        assert_eq!(node.accent, Rgb::new(0xdb, 0xfe, 0x53));
        assert_eq!((node.width, node.height), (540, 960));

        let mut blank = RenderContext::new(1);
        blank.coach_handle = Some("  ".to_string());
        blank.accent_color = Some("not-a-color".to_string());
        let node = render(&day, &blank);
        assert_eq!(node.coach_handle, DEFAULT_COACH_HANDLE);
        assert_eq!(node.accent, DEFAULT_ACCENT);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("a<b & 'c'>"), "a&lt;b &amp; &apos;c&apos;&gt;");
    }
}
