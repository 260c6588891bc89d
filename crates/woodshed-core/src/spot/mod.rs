//! Spot types: the atomic practice target.
//!
//! A spot is a user-marked rectangular region on a page of a piece,
//! carrying classification (priority, color tag, difficulty), scheduling
//! state (readiness level, last practiced, next due) and an append-only
//! practice history.
//!
//! Scheduling invariant: `next_due` is only ever written from a scheduler
//! computation (`srs::record_outcome`); it is never set independently.
//! History entries are never mutated or deleted. Spots are soft-deleted
//! (`active = false`) so history stays available for analytics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Readiness level of a spot.
///
/// Levels follow a strict ordered progression:
///
///   NEW ──> LEARNING ──> REVIEW ──> MASTERED
///
/// A good or excellent practice outcome advances one step (ceiling at
/// Mastered); a failed or struggled outcome regresses one step (floor at
/// New). Derived ordering follows declaration order.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessLevel {
    /// Never successfully practiced (initial state)
    New,
    /// In active acquisition
    Learning,
    /// Acquired, under periodic review
    Review,
    /// Stable; long review intervals
    Mastered,
}

impl ReadinessLevel {
    /// Advance one step, saturating at Mastered.
    pub fn advanced(self) -> Self {
        match self {
            ReadinessLevel::New => ReadinessLevel::Learning,
            ReadinessLevel::Learning => ReadinessLevel::Review,
            ReadinessLevel::Review | ReadinessLevel::Mastered => ReadinessLevel::Mastered,
        }
    }

    /// Regress one step, saturating at New.
    pub fn regressed(self) -> Self {
        match self {
            ReadinessLevel::New | ReadinessLevel::Learning => ReadinessLevel::New,
            ReadinessLevel::Review => ReadinessLevel::Learning,
            ReadinessLevel::Mastered => ReadinessLevel::Review,
        }
    }
}

impl Default for ReadinessLevel {
    fn default() -> Self {
        ReadinessLevel::New
    }
}

/// Qualitative result of a practice attempt, worst to best.
///
/// Derived ordering follows declaration order, so `Failed < Struggled <
/// Good < Excellent`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PracticeResult {
    /// Could not play the passage
    Failed,
    /// Got through with significant errors
    Struggled,
    /// Solid run with minor slips
    Good,
    /// Clean, confident run
    Excellent,
}

impl PracticeResult {
    /// Whether this outcome advances the readiness level.
    pub fn is_positive(self) -> bool {
        matches!(self, PracticeResult::Good | PracticeResult::Excellent)
    }
}

/// User-assigned priority of a spot.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Default for Priority {
    fn default() -> Self {
        Priority::Medium
    }
}

/// Color tag of a spot.
///
/// Doubles as a coarse urgency bucket in the original application
/// (red = critical, yellow = review, green = maintenance). The bucket is
/// presentation only: urgency is computed from scheduling state, never
/// from the color.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorTag {
    Red,
    Yellow,
    Green,
}

impl Default for ColorTag {
    fn default() -> Self {
        ColorTag::Yellow
    }
}

/// Normalized bounding box of a spot on its page.
///
/// All coordinates are fractions of page dimensions in [0, 1]. Geometry is
/// immutable once placed except through an explicit user edit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PageRegion {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PageRegion {
    /// Validate that all coordinates lie within [0, 1] and the box stays
    /// on the page.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
        ];
        for (field, value) in fields {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::GeometryOutOfRange { field, value });
            }
        }
        if self.x + self.width > 1.0 {
            return Err(ValidationError::GeometryOutOfRange {
                field: "x+width",
                value: self.x + self.width,
            });
        }
        if self.y + self.height > 1.0 {
            return Err(ValidationError::GeometryOutOfRange {
                field: "y+height",
                value: self.y + self.height,
            });
        }
        Ok(())
    }
}

/// One recorded practice attempt. Append-only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PracticeAttempt {
    /// When the attempt finished
    pub at: DateTime<Utc>,
    /// How long the attempt took, in minutes
    pub duration_minutes: i64,
    /// Qualitative outcome
    pub result: PracticeResult,
}

impl PracticeAttempt {
    /// Validate a single attempt.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.duration_minutes <= 0 {
            return Err(ValidationError::NonPositiveDuration {
                minutes: self.duration_minutes,
            });
        }
        Ok(())
    }
}

/// A practice spot: a rectangular region on a page of a piece, treated as
/// an atomic practice target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spot {
    pub id: String,
    pub piece_id: String,
    /// 1-based page number within the piece
    pub page: u32,
    pub region: PageRegion,
    pub priority: Priority,
    pub color: ColorTag,
    /// Difficulty on a 1-5 scale
    pub difficulty: i32,
    pub readiness: ReadinessLevel,
    /// Last completed practice attempt, if any
    pub last_practiced: Option<DateTime<Utc>>,
    /// When the spot next comes due. None means due immediately.
    pub next_due: Option<DateTime<Utc>>,
    /// Recommended practice duration per session, in minutes
    pub recommended_minutes: i64,
    /// Append-only attempt log, oldest first
    pub history: Vec<PracticeAttempt>,
    /// Soft-delete flag; inactive spots keep their history
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Spot {
    /// Create a new spot. New spots start at readiness New with no due
    /// date, which the scheduler treats as due immediately.
    pub fn new(id: String, piece_id: String, page: u32, region: PageRegion, now: DateTime<Utc>) -> Self {
        Self {
            id,
            piece_id,
            page,
            region,
            priority: Priority::default(),
            color: ColorTag::default(),
            difficulty: 3,
            readiness: ReadinessLevel::default(),
            last_practiced: None,
            next_due: None,
            recommended_minutes: 10,
            history: Vec::new(),
            active: true,
            created_at: now,
            updated_at: now,
        }
    }

    /// Validate classification, geometry and history.
    ///
    /// # Errors
    ///
    /// Returns the first [`ValidationError`] found: out-of-range
    /// difficulty, malformed geometry, non-positive attempt durations or
    /// a non-chronological history.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=5).contains(&self.difficulty) {
            return Err(ValidationError::DifficultyOutOfRange {
                value: self.difficulty,
            });
        }
        if self.recommended_minutes <= 0 {
            return Err(ValidationError::NonPositiveDuration {
                minutes: self.recommended_minutes,
            });
        }
        self.region.validate()?;
        for (index, attempt) in self.history.iter().enumerate() {
            attempt.validate()?;
            if index > 0 && attempt.at < self.history[index - 1].at {
                return Err(ValidationError::HistoryOutOfOrder { index });
            }
        }
        Ok(())
    }

    /// Whether the spot is due at `now`. A spot with no due date is due
    /// immediately.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.next_due {
            Some(due) => now >= due,
            None => true,
        }
    }

    /// Minutes the spot has sat unpracticed past its due date at `now`.
    /// Zero when not yet due or when no due date is set.
    pub fn overdue_minutes(&self, now: DateTime<Utc>) -> i64 {
        match self.next_due {
            Some(due) if now > due => (now - due).num_minutes(),
            _ => 0,
        }
    }

    /// Total minutes logged across the whole history.
    pub fn total_practice_minutes(&self) -> i64 {
        self.history.iter().map(|a| a.duration_minutes).sum()
    }
}
