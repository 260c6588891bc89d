//! Practice analytics over preserved history.
//!
//! Spots are soft-deleted precisely so their history stays available
//! here: analytics include inactive spots' attempts, while scheduling
//! views (due counts, critical counts) only consider active spots.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::readiness::ReadinessScorer;
use crate::spot::{PracticeResult, ReadinessLevel, Spot};

/// Attempt counts per qualitative result.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ResultCounts {
    pub failed: u32,
    pub struggled: u32,
    pub good: u32,
    pub excellent: u32,
}

impl ResultCounts {
    /// Total attempts counted.
    pub fn total(&self) -> u32 {
        self.failed + self.struggled + self.good + self.excellent
    }

    fn record(&mut self, result: PracticeResult) {
        match result {
            PracticeResult::Failed => self.failed += 1,
            PracticeResult::Struggled => self.struggled += 1,
            PracticeResult::Good => self.good += 1,
            PracticeResult::Excellent => self.excellent += 1,
        }
    }
}

/// Aggregate practice overview for a set of spots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PracticeOverview {
    /// Total minutes logged, including soft-deleted spots
    pub total_practice_minutes: i64,
    /// Attempt counts by result, including soft-deleted spots
    pub attempts: ResultCounts,
    pub active_spots: usize,
    pub inactive_spots: usize,
    /// Active spots due at the reference time
    pub due_spots: usize,
    /// Active, unmastered spots flagged red or at/past due
    pub critical_spots: usize,
    /// Active spots at the Mastered level
    pub mastered_spots: usize,
}

/// Minutes practiced on one calendar day (UTC).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyPractice {
    pub date: NaiveDate,
    pub minutes: i64,
}

/// Practice statistics analyzer.
#[derive(Debug, Clone, Default)]
pub struct PracticeAnalyzer;

impl PracticeAnalyzer {
    pub fn new() -> Self {
        Self
    }

    /// Build an overview of a spot collection at `now`.
    pub fn overview(&self, spots: &[Spot], now: DateTime<Utc>) -> PracticeOverview {
        let mut attempts = ResultCounts::default();
        let mut total_minutes = 0i64;
        let mut active = 0usize;
        let mut inactive = 0usize;
        let mut due = 0usize;
        let mut critical = 0usize;
        let mut mastered = 0usize;

        for spot in spots {
            total_minutes += spot.total_practice_minutes();
            for attempt in &spot.history {
                attempts.record(attempt.result);
            }

            if spot.active {
                active += 1;
                if spot.is_due(now) {
                    due += 1;
                }
                if ReadinessScorer::is_critical(spot, now) {
                    critical += 1;
                }
                if spot.readiness == ReadinessLevel::Mastered {
                    mastered += 1;
                }
            } else {
                inactive += 1;
            }
        }

        PracticeOverview {
            total_practice_minutes: total_minutes,
            attempts,
            active_spots: active,
            inactive_spots: inactive,
            due_spots: due,
            critical_spots: critical,
            mastered_spots: mastered,
        }
    }

    /// Minutes practiced per day over the last `days` days (inclusive of
    /// today), oldest first. Days without practice are present with zero
    /// minutes so callers can chart gaps.
    pub fn daily_minutes(&self, spots: &[Spot], days: u32, now: DateTime<Utc>) -> Vec<DailyPractice> {
        let today = now.date_naive();
        let start = today - Duration::days(days as i64 - 1);

        let mut per_day: Vec<DailyPractice> = (0..days)
            .map(|offset| DailyPractice {
                date: start + Duration::days(offset as i64),
                minutes: 0,
            })
            .collect();

        for spot in spots {
            for attempt in &spot.history {
                let date = attempt.at.date_naive();
                if date < start || date > today {
                    continue;
                }
                let index = (date - start).num_days() as usize;
                per_day[index].minutes += attempt.duration_minutes;
            }
        }

        per_day
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spot::{PageRegion, PracticeAttempt};

    fn make_test_spot(id: &str) -> Spot {
        Spot::new(
            id.to_string(),
            "piece-1".to_string(),
            1,
            PageRegion {
                x: 0.0,
                y: 0.0,
                width: 0.2,
                height: 0.1,
            },
            Utc::now(),
        )
    }

    fn attempt(at: DateTime<Utc>, minutes: i64, result: PracticeResult) -> PracticeAttempt {
        PracticeAttempt {
            at,
            duration_minutes: minutes,
            result,
        }
    }

    #[test]
    fn test_overview_counts() {
        let now = Utc::now();
        let mut practiced = make_test_spot("s1");
        practiced.history.push(attempt(now, 10, PracticeResult::Good));
        practiced.history.push(attempt(now, 5, PracticeResult::Failed));

        let mut retired = make_test_spot("s2");
        retired.active = false;
        retired.history.push(attempt(now, 20, PracticeResult::Excellent));

        let overview = PracticeAnalyzer::new().overview(&[practiced, retired], now);

        // Soft-deleted history still counts toward totals
        assert_eq!(overview.total_practice_minutes, 35);
        assert_eq!(overview.attempts.total(), 3);
        assert_eq!(overview.attempts.good, 1);
        assert_eq!(overview.attempts.excellent, 1);
        assert_eq!(overview.active_spots, 1);
        assert_eq!(overview.inactive_spots, 1);
        // New spot with no due date is due immediately
        assert_eq!(overview.due_spots, 1);
        assert_eq!(overview.critical_spots, 1);
        assert_eq!(overview.mastered_spots, 0);
    }

    #[test]
    fn test_daily_minutes_fills_gaps() {
        let now = Utc::now();
        let mut spot = make_test_spot("s1");
        spot.history.push(attempt(now - Duration::days(2), 15, PracticeResult::Good));
        spot.history.push(attempt(now, 10, PracticeResult::Good));
        spot.history.push(attempt(now, 5, PracticeResult::Struggled));
        // Outside the window, ignored
        spot.history.insert(0, attempt(now - Duration::days(10), 60, PracticeResult::Good));

        let daily = PracticeAnalyzer::new().daily_minutes(&[spot], 3, now);

        assert_eq!(daily.len(), 3);
        assert_eq!(daily[0].minutes, 15);
        assert_eq!(daily[1].minutes, 0);
        assert_eq!(daily[2].minutes, 15);
    }
}
