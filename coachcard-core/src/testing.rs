//! Test doubles shared by the unit tests

use async_trait::async_trait;
use image::{DynamicImage, ImageFormat, RgbImage};
use std::collections::{HashMap, VecDeque};
use std::io::Cursor;
use std::sync::Mutex;
use std::time::Duration;

use coachcard_common::WorkoutPlan;
use coachcard_common::factory::{create_exercise, create_workout_day, create_workout_plan};

use crate::capture::{CaptureOptions, Capturer, RasterImage};
use crate::clock::Clock;
use crate::error::CaptureError;
use crate::template::{self, RenderContext, VisualNode};

pub fn sample_node(week_number: u32, day_number: u32) -> VisualNode {
    let mut day = create_workout_day(day_number);
    day.muscle_group = "Pierna".to_string();
    day.exercises = vec![create_exercise("Sentadilla"), create_exercise("Prensa")];
    template::render(&day, &RenderContext::new(week_number))
}

/// `weeks` x `days` plan where every day has a named exercise
pub fn sample_plan(weeks: usize, days: usize) -> WorkoutPlan {
    let mut plan = create_workout_plan(weeks, days);
    for week in &mut plan.weeks {
        for day in &mut week.days {
            day.muscle_group = format!("Grupo {}", day.day_number);
            day.exercises[0].name = "Peso muerto".to_string();
        }
    }
    plan
}

/// Flat card-background PNG of the given size
pub fn solid_png(width: u32, height: u32) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, image::Rgb([0x0a, 0x0a, 0x0a]));
    let mut bytes = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(image)
        .write_to(&mut bytes, ImageFormat::Png)
        .unwrap();
    bytes.into_inner()
}

#[derive(Debug, Clone)]
pub enum PassOutcome {
    Succeed,
    Fail(String),
    Panic,
}

/// Capturer with scripted outcomes. Records every pass it sees.
///
/// Scripted outcomes are consumed first, one per pass; after that a pass
/// succeeds unless its week/day was marked with `fail_day`.
#[derive(Default)]
pub struct FakeCapturer {
    script: Mutex<VecDeque<PassOutcome>>,
    failing_days: Mutex<HashMap<(u32, u32), String>>,
    calls: Mutex<Vec<((u32, u32), CaptureOptions)>>,
    png: Option<Vec<u8>>,
}

impl FakeCapturer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scripted(outcomes: Vec<PassOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into()),
            ..Self::default()
        }
    }

    /// Successful passes return this real PNG instead of a labelled stub
    pub fn producing_png(mut self, width: u32, height: u32) -> Self {
        self.png = Some(solid_png(width, height));
        self
    }

    pub fn fail_day(self, week_number: u32, day_number: u32, message: &str) -> Self {
        self.failing_days
            .lock()
            .unwrap()
            .insert((week_number, day_number), message.to_string());
        self
    }

    pub fn calls(&self) -> Vec<((u32, u32), CaptureOptions)> {
        self.calls.lock().unwrap().clone()
    }

    /// Distinct (week, day) pairs in the order they were first captured
    pub fn captured_days(&self) -> Vec<(u32, u32)> {
        let mut days: Vec<(u32, u32)> = Vec::new();
        for (key, _) in self.calls() {
            if !days.contains(&key) {
                days.push(key);
            }
        }
        days
    }
}

#[async_trait]
impl Capturer for FakeCapturer {
    fn name(&self) -> &'static str {
        "fake"
    }

    async fn rasterize(
        &self,
        node: &VisualNode,
        options: &CaptureOptions,
    ) -> Result<RasterImage, CaptureError> {
        let key = (node.week_number, node.day_number);
        let pass = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((key, options.clone()));
            calls.iter().filter(|(seen, _)| *seen == key).count()
        };

        let outcome = self.script.lock().unwrap().pop_front();
        let outcome = match outcome {
            Some(outcome) => outcome,
            None => match self.failing_days.lock().unwrap().get(&key) {
                Some(message) => PassOutcome::Fail(message.clone()),
                None => PassOutcome::Succeed,
            },
        };

        match outcome {
            PassOutcome::Succeed => Ok(RasterImage::Png(match &self.png {
                Some(png) => png.clone(),
                None => format!("w{}d{}-pass-{}", key.0, key.1, pass).into_bytes(),
            })),
            PassOutcome::Fail(message) => Err(CaptureError::raster(message)),
            PassOutcome::Panic => panic!("rasterizer crashed"),
        }
    }
}

/// Clock that returns immediately and remembers what it was asked to wait
#[derive(Default)]
pub struct RecordingClock {
    sleeps: Mutex<Vec<Duration>>,
}

impl RecordingClock {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

#[async_trait]
impl Clock for RecordingClock {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

/// Clock whose sleeps never finish
pub struct StalledClock;

#[async_trait]
impl Clock for StalledClock {
    async fn sleep(&self, _duration: Duration) {
        std::future::pending::<()>().await;
    }
}
