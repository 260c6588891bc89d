//! Repertoire types: pieces and projects.
//!
//! A piece is a musical work containing zero or more spots; a project is
//! an ordered collection of piece references with an optional concert
//! date and a daily practice-time goal. Readiness percentages are derived
//! properties, recomputed from spots on every read (see the `readiness`
//! module); they are never stored on these types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A musical work under practice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Piece {
    pub id: String,
    pub title: String,
    pub composer: Option<String>,
    /// Overall difficulty on a 1-5 scale
    pub difficulty: i32,
    /// Target performance tempo (BPM), if set
    pub target_tempo: Option<u32>,
    /// Current comfortable tempo (BPM), if set
    pub current_tempo: Option<u32>,
    /// Accumulated practice minutes across all spots
    pub total_practice_minutes: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Piece {
    /// Create a new piece with default metadata.
    pub fn new(id: String, title: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title,
            composer: None,
            difficulty: 3,
            target_tempo: None,
            current_tempo: None,
            total_practice_minutes: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fraction of target tempo reached, if both tempos are known.
    pub fn tempo_progress(&self) -> Option<f64> {
        match (self.current_tempo, self.target_tempo) {
            (Some(current), Some(target)) if target > 0 => {
                Some((current as f64 / target as f64).min(1.0))
            }
            _ => None,
        }
    }
}

/// An ordered reference to a piece within a project.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PieceRef {
    pub piece_id: String,
    /// Position within the project's programme order
    pub position: u32,
}

/// A practice project: a concert programme or similar goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    /// Concert date, if the project is deadline-driven
    pub concert_date: Option<DateTime<Utc>>,
    /// Daily practice-time goal in minutes, if set
    pub daily_goal_minutes: Option<i64>,
    /// Programme in order
    pub pieces: Vec<PieceRef>,
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Create a new empty project.
    pub fn new(id: String, name: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name,
            concert_date: None,
            daily_goal_minutes: None,
            pieces: Vec::new(),
            created_at: now,
        }
    }

    /// Whole days until the concert, if one is set. Negative once the
    /// date has passed.
    pub fn days_to_concert(&self, now: DateTime<Utc>) -> Option<i64> {
        self.concert_date.map(|date| (date - now).num_days())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_tempo_progress() {
        let mut piece = Piece::new("p-1".to_string(), "Etude".to_string(), Utc::now());
        assert_eq!(piece.tempo_progress(), None);

        piece.target_tempo = Some(120);
        piece.current_tempo = Some(90);
        assert!((piece.tempo_progress().unwrap() - 0.75).abs() < 1e-9);

        // Capped at 1.0 once past the target
        piece.current_tempo = Some(132);
        assert!((piece.tempo_progress().unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_days_to_concert() {
        let now = Utc::now();
        let mut project = Project::new("proj-1".to_string(), "Recital".to_string(), now);
        assert_eq!(project.days_to_concert(now), None);

        project.concert_date = Some(now + Duration::days(3));
        assert_eq!(project.days_to_concert(now), Some(3));

        project.concert_date = Some(now - Duration::days(1));
        assert_eq!(project.days_to_concert(now), Some(-1));
    }

    #[test]
    fn test_project_serialization() {
        let mut project = Project::new("proj-1".to_string(), "Recital".to_string(), Utc::now());
        project.pieces.push(PieceRef {
            piece_id: "p-1".to_string(),
            position: 0,
        });
        let json = serde_json::to_string(&project).unwrap();
        let decoded: Project = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded.pieces.len(), 1);
    }
}
