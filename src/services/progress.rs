use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const INTERMEDIATE_POINTS: u64 = 1000;
pub const ADVANCED_POINTS: u64 = 3000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ProficiencyTier {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl ProficiencyTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "beginner" => Some(Self::Beginner),
            "intermediate" => Some(Self::Intermediate),
            "advanced" => Some(Self::Advanced),
            _ => None,
        }
    }

    /// One step up the ladder if `points` clears the threshold for the next tier.
    /// Never skips a tier and never moves down.
    pub fn upgraded_for(self, points: u64) -> Self {
        match self {
            Self::Beginner if points >= INTERMEDIATE_POINTS => Self::Intermediate,
            Self::Intermediate if points >= ADVANCED_POINTS => Self::Advanced,
            other => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub completed_lessons: BTreeSet<String>,
    pub points: u64,
    pub streak: u32,
    pub last_active: Option<DateTime<Utc>>,
    #[serde(rename = "hindiLevel")]
    pub proficiency_tier: ProficiencyTier,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub completed_lesson_id: Option<String>,
    pub points_delta: Option<i64>,
}

impl ProgressEvent {
    pub fn lesson(id: impl Into<String>) -> Self {
        Self {
            completed_lesson_id: Some(id.into()),
            points_delta: None,
        }
    }

    pub fn points(delta: i64) -> Self {
        Self {
            completed_lesson_id: None,
            points_delta: Some(delta),
        }
    }

    fn lesson_id(&self) -> Option<&str> {
        self.completed_lesson_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProgressError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreakChange {
    Extend,
    Reset,
    Keep,
}

fn streak_change(last_active: Option<NaiveDate>, today: NaiveDate) -> StreakChange {
    let Some(last) = last_active else {
        return StreakChange::Reset;
    };
    let yesterday = today - Duration::days(1);

    if last == yesterday {
        StreakChange::Extend
    } else if last < yesterday {
        StreakChange::Reset
    } else {
        StreakChange::Keep
    }
}

/// Applies one progress event on top of `progress`, returning the new snapshot.
///
/// Day boundaries are evaluated in UTC. The input is never touched, so a
/// rejected event leaves the caller's state exactly as it was.
pub fn apply_progress_event(
    progress: &UserProgress,
    event: &ProgressEvent,
    now: DateTime<Utc>,
) -> Result<UserProgress, ProgressError> {
    if let Some(delta) = event.points_delta {
        if delta < 0 {
            return Err(ProgressError::InvalidArgument(format!(
                "points must be non-negative, got {delta}"
            )));
        }
    }

    let mut next = progress.clone();

    if let Some(lesson_id) = event.lesson_id() {
        next.completed_lessons.insert(lesson_id.to_string());
    }

    if let Some(delta) = event.points_delta {
        next.points = next.points.saturating_add(delta as u64);
    }

    let today = now.date_naive();
    let last = progress.last_active.map(|ts| ts.date_naive());
    match streak_change(last, today) {
        StreakChange::Extend => next.streak = next.streak.saturating_add(1),
        StreakChange::Reset => next.streak = 1,
        StreakChange::Keep => {}
    }

    next.last_active = Some(now);
    next.proficiency_tier = next.proficiency_tier.upgraded_for(next.points);

    Ok(next)
}
