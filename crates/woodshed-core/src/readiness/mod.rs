//! Readiness scoring: aggregating spot state into piece and project
//! readiness.
//!
//! A piece's readiness is a weighted average over its active spots, where
//! each spot contributes more at higher readiness levels and less the
//! longer it sits unpracticed past its due date. A project's readiness is
//! the plain average over its pieces, with spotless pieces counted as 0 so
//! an unprepared programme pulls its own average down.
//!
//! Band thresholds are configuration, not part of the algorithm.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::repertoire::{Piece, Project};
use crate::spot::{ColorTag, ReadinessLevel, Spot};

/// Qualitative readiness band for a 0-100 score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessBand {
    NotReady,
    Developing,
    NearlyReady,
    PerformanceReady,
}

impl ReadinessBand {
    /// Human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            ReadinessBand::NotReady => "Not Ready",
            ReadinessBand::Developing => "Developing",
            ReadinessBand::NearlyReady => "Nearly Ready",
            ReadinessBand::PerformanceReady => "Performance Ready",
        }
    }
}

/// Score thresholds separating the readiness bands.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ReadinessThresholds {
    /// Scores below this are Not Ready
    pub developing: f64,
    /// Scores below this (and at least `developing`) are Developing
    pub nearly_ready: f64,
    /// Scores at or above this are Performance Ready
    pub performance_ready: f64,
}

impl ReadinessThresholds {
    /// Check that thresholds are ordered and within [0, 100].
    pub fn validate(&self) -> Result<(), ValidationError> {
        let ordered = self.developing < self.nearly_ready
            && self.nearly_ready < self.performance_ready;
        let in_range = (0.0..=100.0).contains(&self.developing)
            && (0.0..=100.0).contains(&self.performance_ready);
        if !ordered || !in_range {
            return Err(ValidationError::InvalidValue {
                field: "readiness_thresholds".to_string(),
                message: format!(
                    "thresholds must be ordered within [0, 100], got {} / {} / {}",
                    self.developing, self.nearly_ready, self.performance_ready
                ),
            });
        }
        Ok(())
    }
}

impl Default for ReadinessThresholds {
    fn default() -> Self {
        Self {
            developing: 40.0,
            nearly_ready: 70.0,
            performance_ready: 90.0,
        }
    }
}

/// Project-level readiness report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectReadiness {
    /// Average piece readiness, 0-100
    pub overall_score: f64,
    pub band: ReadinessBand,
    /// Prioritized, rule-based guidance. Deterministic for given inputs.
    pub recommendations: Vec<String>,
}

/// Per-piece readiness detail inside a project report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieceReadiness {
    pub piece_id: String,
    pub title: String,
    pub score: f64,
    pub band: ReadinessBand,
    /// Active, unmastered spots that are due and flagged red or overdue
    pub critical_spots: usize,
}

/// Readiness scorer with configurable band thresholds.
#[derive(Debug, Clone)]
pub struct ReadinessScorer {
    thresholds: ReadinessThresholds,
}

/// How many days of concert runway trigger deadline-driven guidance.
const DEADLINE_HORIZON_DAYS: i64 = 14;

impl ReadinessScorer {
    /// Create a scorer with default thresholds.
    pub fn new() -> Self {
        Self {
            thresholds: ReadinessThresholds::default(),
        }
    }

    /// Create with custom thresholds.
    pub fn with_thresholds(thresholds: ReadinessThresholds) -> Self {
        Self { thresholds }
    }

    /// Current thresholds.
    pub fn thresholds(&self) -> &ReadinessThresholds {
        &self.thresholds
    }

    /// Nominal contribution of a readiness level, in [0, 1].
    fn level_score(level: ReadinessLevel) -> f64 {
        match level {
            ReadinessLevel::New => 0.1,
            ReadinessLevel::Learning => 0.4,
            ReadinessLevel::Review => 0.7,
            ReadinessLevel::Mastered => 1.0,
        }
    }

    /// Discount for a spot sitting unpracticed past its due date.
    /// 1.0 when current; halves after a week overdue.
    fn overdue_factor(spot: &Spot, now: DateTime<Utc>) -> f64 {
        let overdue_days = spot.overdue_minutes(now) as f64 / 1440.0;
        1.0 / (1.0 + overdue_days / 7.0)
    }

    /// Readiness of a piece, 0-100, from its spots.
    ///
    /// Weighted average over active spots: each spot is weighted by its
    /// difficulty, contributes more at higher readiness levels, and is
    /// discounted by overdue-ness. A piece with zero active spots scores
    /// 0: empty pieces are "not started", not undefined.
    pub fn piece_readiness(&self, spots: &[Spot], now: DateTime<Utc>) -> f64 {
        let mut weighted_sum = 0.0;
        let mut weight_total = 0.0;

        for spot in spots.iter().filter(|s| s.active) {
            let weight = spot.difficulty as f64;
            let contribution = Self::level_score(spot.readiness) * Self::overdue_factor(spot, now);
            weighted_sum += weight * contribution;
            weight_total += weight;
        }

        if weight_total == 0.0 {
            return 0.0;
        }
        (weighted_sum / weight_total * 100.0).clamp(0.0, 100.0)
    }

    /// Band for a 0-100 score under the configured thresholds.
    pub fn band_for(&self, score: f64) -> ReadinessBand {
        if score >= self.thresholds.performance_ready {
            ReadinessBand::PerformanceReady
        } else if score >= self.thresholds.nearly_ready {
            ReadinessBand::NearlyReady
        } else if score >= self.thresholds.developing {
            ReadinessBand::Developing
        } else {
            ReadinessBand::NotReady
        }
    }

    /// Whether a spot counts as critical: active, unmastered, and either
    /// flagged red or sitting at/past its due date.
    pub fn is_critical(spot: &Spot, now: DateTime<Utc>) -> bool {
        spot.active
            && spot.readiness < ReadinessLevel::Mastered
            && (spot.color == ColorTag::Red || spot.is_due(now))
    }

    /// Per-piece readiness breakdown, preserving the given piece order.
    pub fn piece_breakdown(
        &self,
        pieces: &[(Piece, Vec<Spot>)],
        now: DateTime<Utc>,
    ) -> Vec<PieceReadiness> {
        pieces
            .iter()
            .map(|(piece, spots)| {
                let score = self.piece_readiness(spots, now);
                PieceReadiness {
                    piece_id: piece.id.clone(),
                    title: piece.title.clone(),
                    score,
                    band: self.band_for(score),
                    critical_spots: spots.iter().filter(|s| Self::is_critical(s, now)).count(),
                }
            })
            .collect()
    }

    /// Project readiness: overall score, band, and prioritized
    /// recommendations.
    ///
    /// The score is the plain average over the supplied pieces; pieces
    /// without spots contribute 0 rather than being excluded, so an empty
    /// programme pulls the average down. Recommendations are ordered:
    /// deadline-driven guidance first, then per-piece critical-spot
    /// focus messages (most critical first), then warnings for spotless
    /// pieces, then a band-default message when no deadline is pressing.
    pub fn project_readiness(
        &self,
        project: &Project,
        pieces: &[(Piece, Vec<Spot>)],
        now: DateTime<Utc>,
    ) -> ProjectReadiness {
        let breakdown = self.piece_breakdown(pieces, now);

        let overall_score = if breakdown.is_empty() {
            0.0
        } else {
            breakdown.iter().map(|p| p.score).sum::<f64>() / breakdown.len() as f64
        };
        let band = self.band_for(overall_score);

        let mut recommendations = Vec::new();

        let deadline_pressing = match project.days_to_concert(now) {
            Some(days) if days <= DEADLINE_HORIZON_DAYS => {
                if days < 0 {
                    recommendations
                        .push("Concert date has passed: update the project deadline".to_string());
                } else {
                    recommendations.push(format!(
                        "Concert in {} days: prioritize performance readiness",
                        days
                    ));
                }
                true
            }
            _ => false,
        };

        let mut critical: Vec<&PieceReadiness> =
            breakdown.iter().filter(|p| p.critical_spots > 0).collect();
        critical.sort_by(|a, b| {
            b.critical_spots
                .cmp(&a.critical_spots)
                .then_with(|| a.title.cmp(&b.title))
        });
        for piece in critical {
            recommendations.push(format!(
                "Focus on {}: {} critical spot{}",
                piece.title,
                piece.critical_spots,
                if piece.critical_spots == 1 { "" } else { "s" }
            ));
        }

        if breakdown.is_empty() {
            recommendations.push("No pieces assigned to this project yet".to_string());
        }
        for piece in breakdown.iter().filter(|p| p.score == 0.0) {
            recommendations.push(format!(
                "No practice progress in {}: mark spots to start tracking readiness",
                piece.title
            ));
        }

        if !deadline_pressing {
            recommendations.push(
                match band {
                    ReadinessBand::NotReady => {
                        "Overall readiness is low: build a daily practice routine"
                    }
                    ReadinessBand::Developing => {
                        "Keep working the weakest spots to raise overall readiness"
                    }
                    ReadinessBand::NearlyReady => "Start full run-throughs to consolidate",
                    ReadinessBand::PerformanceReady => {
                        "Maintain muscle memory with short review sessions"
                    }
                }
                .to_string(),
            );
        }

        ProjectReadiness {
            overall_score,
            band,
            recommendations,
        }
    }
}

impl Default for ReadinessScorer {
    fn default() -> Self {
        Self::new()
    }
}
