//! Spaced-repetition scheduler for practice spots.
//!
//! Given a just-completed practice attempt, the scheduler computes the
//! spot's next readiness level and next-due timestamp; given a spot and a
//! clock, it computes an urgency score in [0, 1].
//!
//! Interval model:
//!
//! ```text
//! interval = base_interval(updated_level) * profile_multiplier
//! ```
//!
//! Base intervals grow with readiness level (new < learning < review <
//! mastered). A failed or struggled outcome regresses the level one step,
//! which shrinks the interval; a good or excellent outcome advances it,
//! which grows the interval. An upcoming concert clamps the result: a
//! spot is never scheduled later than the concert minus a safety margin,
//! and never past the concert itself.
//!
//! All functions are pure over immutable snapshots; persisting the
//! returned values is the caller's job.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::spot::{PracticeResult, ReadinessLevel, Spot};

/// Review-spacing profile.
///
/// Controls how tightly reviews are spaced: aggressive reviews more often
/// (shorter intervals), gentle less often (longer intervals).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SrsProfile {
    /// Short intervals, frequent review
    Aggressive,
    /// Baseline spacing
    Standard,
    /// Long intervals, infrequent review
    Gentle,
}

impl SrsProfile {
    /// Multiplier applied to the base interval for this profile.
    pub fn interval_multiplier(self) -> f64 {
        match self {
            SrsProfile::Aggressive => 0.5,
            SrsProfile::Standard => 1.0,
            SrsProfile::Gentle => 1.5,
        }
    }
}

impl Default for SrsProfile {
    fn default() -> Self {
        SrsProfile::Standard
    }
}

/// Output of an outcome-recording computation.
///
/// `next_due` is the only legitimate source for a spot's due date; the
/// storage layer writes it back verbatim.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ScheduleUpdate {
    /// Readiness level after the outcome is applied
    pub readiness: ReadinessLevel,
    /// When the spot next comes due
    pub next_due: DateTime<Utc>,
    /// The interval that produced `next_due`, in minutes (before any
    /// deadline clamp)
    pub interval_minutes: i64,
}

/// Spaced-repetition scheduler.
#[derive(Debug, Clone)]
pub struct SrsScheduler {
    profile: SrsProfile,
    /// Margin kept between the last scheduled review and the concert
    safety_margin: Duration,
}

impl SrsScheduler {
    /// Create a scheduler with the standard profile and a one-day safety
    /// margin.
    pub fn new() -> Self {
        Self {
            profile: SrsProfile::Standard,
            safety_margin: Duration::days(1),
        }
    }

    /// Create with a specific profile.
    pub fn with_profile(profile: SrsProfile) -> Self {
        Self {
            profile,
            safety_margin: Duration::days(1),
        }
    }

    /// Override the concert safety margin.
    pub fn with_safety_margin(mut self, margin: Duration) -> Self {
        self.safety_margin = margin;
        self
    }

    /// Current profile.
    pub fn profile(&self) -> SrsProfile {
        self.profile
    }

    /// Base review interval for a readiness level, before profile scaling.
    pub fn base_interval(level: ReadinessLevel) -> Duration {
        match level {
            ReadinessLevel::New => Duration::days(1),
            ReadinessLevel::Learning => Duration::days(3),
            ReadinessLevel::Review => Duration::days(7),
            ReadinessLevel::Mastered => Duration::days(21),
        }
    }

    /// Scheduling state for a freshly placed spot: due immediately,
    /// regardless of profile.
    pub fn initial_schedule(&self, now: DateTime<Utc>) -> ScheduleUpdate {
        ScheduleUpdate {
            readiness: ReadinessLevel::New,
            next_due: now,
            interval_minutes: 0,
        }
    }

    /// Apply a practice outcome to a spot snapshot.
    ///
    /// The spot itself is not mutated; the caller appends the attempt to
    /// the history and writes back the returned readiness and due date.
    ///
    /// # Errors
    ///
    /// Rejects spots with malformed state (invalid geometry, difficulty,
    /// or history) rather than scheduling on top of corrupt data.
    pub fn record_outcome(
        &self,
        spot: &Spot,
        result: PracticeResult,
        now: DateTime<Utc>,
        concert_date: Option<DateTime<Utc>>,
    ) -> Result<ScheduleUpdate, ValidationError> {
        spot.validate()?;

        let readiness = if result.is_positive() {
            spot.readiness.advanced()
        } else {
            spot.readiness.regressed()
        };

        let interval = Self::base_interval(readiness);
        let scaled_minutes =
            (interval.num_minutes() as f64 * self.profile.interval_multiplier()).round() as i64;
        let mut next_due = now + Duration::minutes(scaled_minutes);

        if let Some(concert) = concert_date {
            let cap = concert - self.safety_margin;
            next_due = next_due.min(cap).max(now).min(concert);
        }

        Ok(ScheduleUpdate {
            readiness,
            next_due,
            interval_minutes: scaled_minutes,
        })
    }

    /// Urgency of a spot at `now`, in [0, 1].
    ///
    /// Exactly 0 at any time strictly before the due date. Once due, the
    /// score rises with overdue time on a saturating curve, and an
    /// approaching concert pushes any unmastered spot toward 1.
    pub fn urgency_score(
        &self,
        spot: &Spot,
        now: DateTime<Utc>,
        concert_date: Option<DateTime<Utc>>,
    ) -> f64 {
        let due = match spot.next_due {
            Some(due) => due,
            // No due date means due immediately
            None => now,
        };
        if now < due {
            return 0.0;
        }

        let overdue_days = (now - due).num_minutes() as f64 / 1440.0;
        let mut score = overdue_days / (overdue_days + 3.0);

        if spot.readiness < ReadinessLevel::Mastered {
            if let Some(concert) = concert_date {
                let days_left = (concert - now).num_minutes() as f64 / 1440.0;
                let pressure = if days_left <= 0.0 {
                    1.0
                } else {
                    1.0 / (1.0 + days_left)
                };
                score = score.max(pressure);
            }
        }

        score.clamp(0.0, 1.0)
    }
}

impl Default for SrsScheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spot::PageRegion;
    use proptest::prelude::*;

    fn make_test_spot(readiness: ReadinessLevel, next_due: Option<DateTime<Utc>>) -> Spot {
        let mut spot = Spot::new(
            "spot-1".to_string(),
            "piece-1".to_string(),
            1,
            PageRegion {
                x: 0.1,
                y: 0.1,
                width: 0.2,
                height: 0.1,
            },
            Utc::now(),
        );
        spot.readiness = readiness;
        spot.next_due = next_due;
        spot
    }

    #[test]
    fn test_excellent_from_new_advances_to_learning() {
        let scheduler = SrsScheduler::new();
        let now = Utc::now();
        let spot = make_test_spot(ReadinessLevel::New, None);

        let update = scheduler
            .record_outcome(&spot, PracticeResult::Excellent, now, None)
            .unwrap();

        assert_eq!(update.readiness, ReadinessLevel::Learning);
        // Standard profile: base learning interval, unscaled
        assert_eq!(update.next_due, now + Duration::days(3));
    }

    #[test]
    fn test_failed_regresses_and_shrinks_interval() {
        let scheduler = SrsScheduler::new();
        let now = Utc::now();
        let spot = make_test_spot(ReadinessLevel::Review, Some(now));

        let update = scheduler
            .record_outcome(&spot, PracticeResult::Failed, now, None)
            .unwrap();

        assert_eq!(update.readiness, ReadinessLevel::Learning);
        assert_eq!(update.next_due, now + Duration::days(3));
    }

    #[test]
    fn test_profile_multipliers() {
        let now = Utc::now();
        let spot = make_test_spot(ReadinessLevel::New, None);

        let aggressive = SrsScheduler::with_profile(SrsProfile::Aggressive)
            .record_outcome(&spot, PracticeResult::Good, now, None)
            .unwrap();
        let standard = SrsScheduler::with_profile(SrsProfile::Standard)
            .record_outcome(&spot, PracticeResult::Good, now, None)
            .unwrap();
        let gentle = SrsScheduler::with_profile(SrsProfile::Gentle)
            .record_outcome(&spot, PracticeResult::Good, now, None)
            .unwrap();

        assert!(aggressive.next_due < standard.next_due);
        assert!(standard.next_due < gentle.next_due);
    }

    #[test]
    fn test_deadline_clamp() {
        let scheduler = SrsScheduler::new();
        let now = Utc::now();
        let concert = now + Duration::days(2);
        let spot = make_test_spot(ReadinessLevel::Review, Some(now));

        // Naive interval (mastered base, 21 days) reaches far past the concert
        let update = scheduler
            .record_outcome(&spot, PracticeResult::Excellent, now, Some(concert))
            .unwrap();

        assert!(update.next_due <= concert - Duration::days(1));
        assert!(update.next_due <= concert);
        assert!(update.next_due >= now);
    }

    #[test]
    fn test_deadline_clamp_with_imminent_concert() {
        let scheduler = SrsScheduler::new();
        let now = Utc::now();
        // Concert inside the safety margin: clamp lands at now, not in the past
        let concert = now + Duration::hours(12);
        let spot = make_test_spot(ReadinessLevel::Learning, Some(now));

        let update = scheduler
            .record_outcome(&spot, PracticeResult::Good, now, Some(concert))
            .unwrap();

        assert_eq!(update.next_due, now);
    }

    #[test]
    fn test_initial_schedule_due_immediately() {
        let now = Utc::now();
        for profile in [SrsProfile::Aggressive, SrsProfile::Standard, SrsProfile::Gentle] {
            let scheduler = SrsScheduler::with_profile(profile);
            let update = scheduler.initial_schedule(now);
            assert_eq!(update.next_due, now);
            assert_eq!(update.readiness, ReadinessLevel::New);
        }
    }

    #[test]
    fn test_rejects_malformed_history() {
        let scheduler = SrsScheduler::new();
        let now = Utc::now();
        let mut spot = make_test_spot(ReadinessLevel::New, None);
        spot.history.push(crate::spot::PracticeAttempt {
            at: now,
            duration_minutes: -5,
            result: PracticeResult::Good,
        });

        let result = scheduler.record_outcome(&spot, PracticeResult::Good, now, None);
        assert!(matches!(
            result,
            Err(ValidationError::NonPositiveDuration { minutes: -5 })
        ));
    }

    #[test]
    fn test_urgency_zero_before_due() {
        let scheduler = SrsScheduler::new();
        let now = Utc::now();
        let spot = make_test_spot(ReadinessLevel::Learning, Some(now + Duration::minutes(1)));
        assert_eq!(scheduler.urgency_score(&spot, now, None), 0.0);

        // Even with a concert tomorrow, not-yet-due spots score 0
        let concert = now + Duration::days(1);
        assert_eq!(scheduler.urgency_score(&spot, now, Some(concert)), 0.0);
    }

    #[test]
    fn test_urgency_grows_with_overdue_time() {
        let scheduler = SrsScheduler::new();
        let now = Utc::now();
        let spot = make_test_spot(ReadinessLevel::Learning, Some(now - Duration::days(7)));
        let week_overdue = scheduler.urgency_score(&spot, now, None);

        let spot_fresh = make_test_spot(ReadinessLevel::Learning, Some(now));
        let just_due = scheduler.urgency_score(&spot_fresh, now, None);

        assert!(week_overdue > just_due);
        assert!(week_overdue > 0.5);
        assert!(week_overdue <= 1.0);
    }

    #[test]
    fn test_urgency_deadline_pressure_for_unmastered() {
        let scheduler = SrsScheduler::new();
        let now = Utc::now();
        let concert = now + Duration::hours(6);

        let spot = make_test_spot(ReadinessLevel::Learning, Some(now));
        let pressured = scheduler.urgency_score(&spot, now, Some(concert));
        assert!(pressured > 0.7);

        // A mastered spot feels no deadline pressure
        let mastered = make_test_spot(ReadinessLevel::Mastered, Some(now));
        let calm = scheduler.urgency_score(&mastered, now, Some(concert));
        assert!(calm < 0.1);
    }

    proptest! {
        /// An excellent outcome never schedules earlier than a failed one.
        #[test]
        fn prop_outcome_quality_monotonic(level_idx in 0usize..4, overdue_hours in 0i64..720) {
            let levels = [
                ReadinessLevel::New,
                ReadinessLevel::Learning,
                ReadinessLevel::Review,
                ReadinessLevel::Mastered,
            ];
            let scheduler = SrsScheduler::new();
            let now = Utc::now();
            let spot = make_test_spot(
                levels[level_idx],
                Some(now - Duration::hours(overdue_hours)),
            );

            let failed = scheduler
                .record_outcome(&spot, PracticeResult::Failed, now, None)
                .unwrap();
            let excellent = scheduler
                .record_outcome(&spot, PracticeResult::Excellent, now, None)
                .unwrap();

            prop_assert!(excellent.next_due >= failed.next_due);
        }

        /// Urgency is non-decreasing as the clock advances past the due date.
        #[test]
        fn prop_urgency_monotonic_in_time(a in 0i64..10_000, b in 0i64..10_000) {
            let (earlier, later) = if a <= b { (a, b) } else { (b, a) };
            let scheduler = SrsScheduler::new();
            let due = Utc::now();
            let spot = make_test_spot(ReadinessLevel::Learning, Some(due));

            let u_earlier = scheduler.urgency_score(&spot, due + Duration::minutes(earlier), None);
            let u_later = scheduler.urgency_score(&spot, due + Duration::minutes(later), None);

            prop_assert!(u_later >= u_earlier);
            prop_assert!((0.0..=1.0).contains(&u_earlier));
            prop_assert!((0.0..=1.0).contains(&u_later));
        }
    }
}
