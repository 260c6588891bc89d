//! Practice session planner.
//!
//! Selects and orders spots into a bounded-duration session plan:
//! - Selection order: descending urgency, ties broken by lower readiness
//!   level, then by longer time since last practice.
//! - Duration packing: greedy; spots accumulate until the target is met,
//!   overshooting by at most one spot's recommended duration.
//! - Interleave mode alternates spots across pieces to force context
//!   switching; blocked mode keeps them grouped by piece.
//! - Microbreaks insert fixed rest markers every configured interval of
//!   accumulated practice time.
//!
//! Planning is deterministic: the same pool, clock and strategy always
//! produce the same plan. An empty pool and a zero target duration are
//! explicit non-plan outcomes, not errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::spot::Spot;
use crate::srs::SrsScheduler;

/// Strategy flags for a practice session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionStrategy {
    /// Alternate spots across pieces instead of grouping by piece
    pub interleave: bool,
    /// Insert rest markers at regular intervals
    pub microbreaks: bool,
}

impl Default for SessionStrategy {
    fn default() -> Self {
        Self {
            interleave: false,
            microbreaks: true,
        }
    }
}

/// Planner timing configuration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct PlannerConfig {
    /// Accumulated practice minutes between microbreaks
    pub microbreak_interval_minutes: i64,
    /// Length of each microbreak
    pub microbreak_minutes: i64,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            microbreak_interval_minutes: 20,
            microbreak_minutes: 3,
        }
    }
}

/// One entry in a session plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlanItem {
    /// Practice one spot
    Practice {
        spot_id: String,
        piece_id: String,
        minutes: i64,
        /// Urgency at planning time, for display
        urgency: f64,
    },
    /// Rest marker
    Rest { minutes: i64 },
}

/// An ordered practice session plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionPlan {
    pub items: Vec<PlanItem>,
    pub total_practice_minutes: i64,
    pub total_rest_minutes: i64,
    pub generated_at: DateTime<Utc>,
}

/// Why a planning request produced no session.
///
/// Both cases are expected caller scenarios: the caller warns the user
/// instead of starting an empty session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmptyPlanReason {
    /// The candidate pool contained no active spots
    NoSpotsAvailable,
    /// The requested session length was zero or negative
    ZeroTargetDuration,
}

impl EmptyPlanReason {
    /// Human-readable explanation.
    pub fn message(self) -> &'static str {
        match self {
            EmptyPlanReason::NoSpotsAvailable => "no spots available to practice",
            EmptyPlanReason::ZeroTargetDuration => "session duration must be positive",
        }
    }
}

/// Result of a planning request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PlanOutcome {
    /// A session was planned
    Session(SessionPlan),
    /// Nothing to plan, with the reason
    Empty { reason: EmptyPlanReason },
}

impl PlanOutcome {
    /// The planned session, if any.
    pub fn session(&self) -> Option<&SessionPlan> {
        match self {
            PlanOutcome::Session(plan) => Some(plan),
            PlanOutcome::Empty { .. } => None,
        }
    }
}

/// Practice session planner.
#[derive(Debug, Clone)]
pub struct SessionPlanner {
    scheduler: SrsScheduler,
    config: PlannerConfig,
}

impl SessionPlanner {
    /// Create a planner around a scheduler, with default timing.
    pub fn new(scheduler: SrsScheduler) -> Self {
        Self {
            scheduler,
            config: PlannerConfig::default(),
        }
    }

    /// Override the timing configuration.
    pub fn with_config(mut self, config: PlannerConfig) -> Self {
        self.config = config;
        self
    }

    /// Plan a session from a pool of candidate spots.
    ///
    /// The pool is whatever scope the caller chose (one piece, a project,
    /// the whole library); inactive spots are ignored. `concert_date`
    /// feeds urgency scoring only.
    pub fn plan(
        &self,
        pool: &[Spot],
        now: DateTime<Utc>,
        target_minutes: i64,
        strategy: SessionStrategy,
        concert_date: Option<DateTime<Utc>>,
    ) -> PlanOutcome {
        if target_minutes <= 0 {
            return PlanOutcome::Empty {
                reason: EmptyPlanReason::ZeroTargetDuration,
            };
        }

        let mut candidates: Vec<&Spot> = pool.iter().filter(|s| s.active).collect();
        if candidates.is_empty() {
            return PlanOutcome::Empty {
                reason: EmptyPlanReason::NoSpotsAvailable,
            };
        }

        let urgency = |spot: &Spot| self.scheduler.urgency_score(spot, now, concert_date);

        candidates.sort_by(|a, b| {
            urgency(b)
                .partial_cmp(&urgency(a))
                .unwrap()
                .then_with(|| a.readiness.cmp(&b.readiness))
                .then_with(|| {
                    // Longer since last practice first; never-practiced wins
                    let a_last = a.last_practiced;
                    let b_last = b.last_practiced;
                    match (a_last, b_last) {
                        (None, None) => std::cmp::Ordering::Equal,
                        (None, Some(_)) => std::cmp::Ordering::Less,
                        (Some(_), None) => std::cmp::Ordering::Greater,
                        (Some(a_at), Some(b_at)) => a_at.cmp(&b_at),
                    }
                })
                .then_with(|| a.id.cmp(&b.id))
        });

        // Greedy packing: keep adding while below the target, so the plan
        // never undershoots by skipping a spot that would fit. Overshoot
        // is bounded by the last spot's duration.
        let mut selected: Vec<&Spot> = Vec::new();
        let mut accumulated = 0i64;
        for spot in candidates {
            if accumulated >= target_minutes {
                break;
            }
            accumulated += spot.recommended_minutes;
            selected.push(spot);
        }

        let ordered = if strategy.interleave {
            Self::interleave_by_piece(selected)
        } else {
            Self::group_by_piece(selected)
        };

        let mut items = Vec::new();
        let mut total_practice = 0i64;
        let mut total_rest = 0i64;
        let mut since_break = 0i64;
        let count = ordered.len();

        for (index, spot) in ordered.into_iter().enumerate() {
            items.push(PlanItem::Practice {
                spot_id: spot.id.clone(),
                piece_id: spot.piece_id.clone(),
                minutes: spot.recommended_minutes,
                urgency: urgency(spot),
            });
            total_practice += spot.recommended_minutes;
            since_break += spot.recommended_minutes;

            let is_last = index + 1 == count;
            if strategy.microbreaks
                && !is_last
                && since_break >= self.config.microbreak_interval_minutes
            {
                items.push(PlanItem::Rest {
                    minutes: self.config.microbreak_minutes,
                });
                total_rest += self.config.microbreak_minutes;
                since_break = 0;
            }
        }

        PlanOutcome::Session(SessionPlan {
            items,
            total_practice_minutes: total_practice,
            total_rest_minutes: total_rest,
            generated_at: now,
        })
    }

    /// Keep spots grouped by piece. Pieces appear in the order of their
    /// most urgent spot; within a piece, selection order is preserved.
    fn group_by_piece(selected: Vec<&Spot>) -> Vec<&Spot> {
        let mut piece_order: Vec<&str> = Vec::new();
        for spot in &selected {
            if !piece_order.contains(&spot.piece_id.as_str()) {
                piece_order.push(&spot.piece_id);
            }
        }

        let mut ordered = Vec::with_capacity(selected.len());
        for piece_id in piece_order {
            ordered.extend(selected.iter().copied().filter(|s| s.piece_id == piece_id));
        }
        ordered
    }

    /// Alternate spots across pieces round-robin, preserving within-piece
    /// urgency order.
    fn interleave_by_piece(selected: Vec<&Spot>) -> Vec<&Spot> {
        let mut piece_order: Vec<&str> = Vec::new();
        for spot in &selected {
            if !piece_order.contains(&spot.piece_id.as_str()) {
                piece_order.push(&spot.piece_id);
            }
        }

        let mut queues: Vec<std::collections::VecDeque<&Spot>> = piece_order
            .iter()
            .map(|piece_id| {
                selected
                    .iter()
                    .copied()
                    .filter(|s| s.piece_id == *piece_id)
                    .collect()
            })
            .collect();

        let mut ordered = Vec::with_capacity(selected.len());
        while ordered.len() < selected.len() {
            for queue in queues.iter_mut() {
                if let Some(spot) = queue.pop_front() {
                    ordered.push(spot);
                }
            }
        }
        ordered
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spot::{PageRegion, ReadinessLevel};
    use chrono::Duration;

    fn make_test_spot(id: &str, piece_id: &str, overdue_hours: i64, minutes: i64) -> Spot {
        let now = Utc::now();
        let mut spot = Spot::new(
            id.to_string(),
            piece_id.to_string(),
            1,
            PageRegion {
                x: 0.0,
                y: 0.0,
                width: 0.2,
                height: 0.1,
            },
            now,
        );
        spot.next_due = Some(now - Duration::hours(overdue_hours));
        spot.recommended_minutes = minutes;
        spot
    }

    fn planner() -> SessionPlanner {
        SessionPlanner::new(SrsScheduler::new())
    }

    fn no_breaks() -> SessionStrategy {
        SessionStrategy {
            interleave: false,
            microbreaks: false,
        }
    }

    #[test]
    fn test_empty_pool_is_explicit() {
        let outcome = planner().plan(&[], Utc::now(), 30, SessionStrategy::default(), None);
        assert_eq!(
            outcome,
            PlanOutcome::Empty {
                reason: EmptyPlanReason::NoSpotsAvailable
            }
        );
    }

    #[test]
    fn test_inactive_only_pool_is_empty() {
        let mut spot = make_test_spot("s1", "p1", 1, 10);
        spot.active = false;
        let outcome = planner().plan(&[spot], Utc::now(), 30, SessionStrategy::default(), None);
        assert!(matches!(
            outcome,
            PlanOutcome::Empty {
                reason: EmptyPlanReason::NoSpotsAvailable
            }
        ));
    }

    #[test]
    fn test_zero_duration_is_explicit() {
        let spot = make_test_spot("s1", "p1", 1, 10);
        let outcome = planner().plan(&[spot], Utc::now(), 0, SessionStrategy::default(), None);
        assert_eq!(
            outcome,
            PlanOutcome::Empty {
                reason: EmptyPlanReason::ZeroTargetDuration
            }
        );
    }

    #[test]
    fn test_urgency_ordering() {
        let now = Utc::now();
        let pool = vec![
            make_test_spot("s-mild", "p1", 2, 10),
            make_test_spot("s-very", "p1", 200, 10),
            make_test_spot("s-mid", "p1", 40, 10),
        ];
        let outcome = planner().plan(&pool, now, 30, no_breaks(), None);
        let plan = outcome.session().unwrap();

        let ids: Vec<&str> = plan
            .items
            .iter()
            .filter_map(|item| match item {
                PlanItem::Practice { spot_id, .. } => Some(spot_id.as_str()),
                PlanItem::Rest { .. } => None,
            })
            .collect();
        assert_eq!(ids, vec!["s-very", "s-mid", "s-mild"]);
    }

    #[test]
    fn test_tie_breaks_lower_readiness_first() {
        let now = Utc::now();
        // Same urgency (same overdue), different readiness
        let mut learning = make_test_spot("s-learning", "p1", 24, 10);
        learning.readiness = ReadinessLevel::Learning;
        let mut new = make_test_spot("s-new", "p1", 24, 10);
        new.readiness = ReadinessLevel::New;

        let outcome = planner().plan(&[learning, new], now, 20, no_breaks(), None);
        let plan = outcome.session().unwrap();
        match &plan.items[0] {
            PlanItem::Practice { spot_id, .. } => assert_eq!(spot_id, "s-new"),
            other => panic!("unexpected item: {:?}", other),
        }
    }

    #[test]
    fn test_packing_overshoots_at_most_one_spot() {
        let now = Utc::now();
        let pool = vec![
            make_test_spot("s1", "p1", 100, 15),
            make_test_spot("s2", "p1", 90, 15),
            make_test_spot("s3", "p1", 80, 15),
            make_test_spot("s4", "p1", 70, 15),
        ];
        let outcome = planner().plan(&pool, now, 30, no_breaks(), None);
        let plan = outcome.session().unwrap();

        // 15 + 15 meets the 30-minute target exactly; s3 must not be added
        assert_eq!(plan.total_practice_minutes, 30);
        assert_eq!(plan.items.len(), 2);
    }

    #[test]
    fn test_packing_never_undershoots() {
        let now = Utc::now();
        let pool = vec![
            make_test_spot("s1", "p1", 100, 10),
            make_test_spot("s2", "p1", 90, 10),
        ];
        let outcome = planner().plan(&pool, now, 60, no_breaks(), None);
        let plan = outcome.session().unwrap();

        // Both spots fit under the target, so both are planned
        assert_eq!(plan.total_practice_minutes, 20);
        assert_eq!(plan.items.len(), 2);
    }

    #[test]
    fn test_blocked_mode_groups_by_piece() {
        let now = Utc::now();
        let pool = vec![
            make_test_spot("a1", "piece-a", 100, 5),
            make_test_spot("b1", "piece-b", 90, 5),
            make_test_spot("a2", "piece-a", 80, 5),
            make_test_spot("b2", "piece-b", 70, 5),
        ];
        let outcome = planner().plan(&pool, now, 20, no_breaks(), None);
        let plan = outcome.session().unwrap();

        let pieces: Vec<&str> = plan
            .items
            .iter()
            .filter_map(|item| match item {
                PlanItem::Practice { piece_id, .. } => Some(piece_id.as_str()),
                PlanItem::Rest { .. } => None,
            })
            .collect();
        assert_eq!(pieces, vec!["piece-a", "piece-a", "piece-b", "piece-b"]);
    }

    #[test]
    fn test_interleave_mode_alternates_pieces() {
        let now = Utc::now();
        let pool = vec![
            make_test_spot("a1", "piece-a", 100, 5),
            make_test_spot("b1", "piece-b", 90, 5),
            make_test_spot("a2", "piece-a", 80, 5),
            make_test_spot("b2", "piece-b", 70, 5),
        ];
        let strategy = SessionStrategy {
            interleave: true,
            microbreaks: false,
        };
        let outcome = planner().plan(&pool, now, 20, strategy, None);
        let plan = outcome.session().unwrap();

        let pieces: Vec<&str> = plan
            .items
            .iter()
            .filter_map(|item| match item {
                PlanItem::Practice { piece_id, .. } => Some(piece_id.as_str()),
                PlanItem::Rest { .. } => None,
            })
            .collect();
        assert_eq!(pieces, vec!["piece-a", "piece-b", "piece-a", "piece-b"]);
    }

    #[test]
    fn test_microbreak_insertion() {
        let now = Utc::now();
        let pool = vec![
            make_test_spot("s1", "p1", 100, 10),
            make_test_spot("s2", "p1", 90, 10),
            make_test_spot("s3", "p1", 80, 10),
            make_test_spot("s4", "p1", 70, 10),
        ];
        let strategy = SessionStrategy {
            interleave: false,
            microbreaks: true,
        };
        let outcome = planner().plan(&pool, now, 40, strategy, None);
        let plan = outcome.session().unwrap();

        // Breaks after every 20 accumulated minutes, never trailing
        let rests = plan
            .items
            .iter()
            .filter(|i| matches!(i, PlanItem::Rest { .. }))
            .count();
        assert_eq!(rests, 1);
        assert_eq!(plan.items[2], PlanItem::Rest { minutes: 3 });
        assert!(!matches!(plan.items.last().unwrap(), PlanItem::Rest { .. }));
        assert_eq!(plan.total_rest_minutes, 3);
    }

    #[test]
    fn test_plan_round_trips_deterministically() {
        let now = Utc::now();
        let pool = vec![
            make_test_spot("a1", "piece-a", 100, 10),
            make_test_spot("b1", "piece-b", 90, 10),
            make_test_spot("a2", "piece-a", 80, 10),
        ];
        let strategy = SessionStrategy {
            interleave: true,
            microbreaks: true,
        };
        let first = planner().plan(&pool, now, 30, strategy, None);
        let second = planner().plan(&pool, now, 30, strategy, None);
        assert_eq!(first, second);

        // Re-planning over the planned spots keeps the same spot order
        let plan = first.session().unwrap();
        let planned_ids: Vec<&str> = plan
            .items
            .iter()
            .filter_map(|item| match item {
                PlanItem::Practice { spot_id, .. } => Some(spot_id.as_str()),
                PlanItem::Rest { .. } => None,
            })
            .collect();
        let subset: Vec<Spot> = pool
            .iter()
            .filter(|s| planned_ids.contains(&s.id.as_str()))
            .cloned()
            .collect();
        let replanned = planner().plan(&subset, now, 30, strategy, None);
        let replanned_ids: Vec<&str> = replanned
            .session()
            .unwrap()
            .items
            .iter()
            .filter_map(|item| match item {
                PlanItem::Practice { spot_id, .. } => Some(spot_id.as_str()),
                PlanItem::Rest { .. } => None,
            })
            .collect();
        assert_eq!(planned_ids, replanned_ids);
    }
}
