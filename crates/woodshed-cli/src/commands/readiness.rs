//! Readiness report commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use woodshed_core::{Config, PracticeDb};

#[derive(Subcommand)]
pub enum ReadinessAction {
    /// Readiness score and band for one piece
    Piece {
        /// Piece ID
        id: String,
    },
    /// Readiness report for a project, with recommendations
    Project {
        /// Project ID
        id: String,
    },
}

pub fn run(action: ReadinessAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = PracticeDb::open()?;
    let config = Config::load_or_default();
    let scorer = config.scorer();
    let now = Utc::now();

    match action {
        ReadinessAction::Piece { id } => {
            let piece = db.get_piece(&id)?.ok_or(format!("Piece not found: {id}"))?;
            let spots = db.list_spots(Some(&piece.id), true)?;
            let score = scorer.piece_readiness(&spots, now);
            let band = scorer.band_for(score);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "piece_id": piece.id,
                    "title": piece.title,
                    "score": score,
                    "band": band,
                    "label": band.label(),
                }))?
            );
        }
        ReadinessAction::Project { id } => {
            let project = db.get_project(&id)?.ok_or(format!("Project not found: {id}"))?;
            let pieces = db.project_pieces_with_spots(&project)?;
            let report = scorer.project_readiness(&project, &pieces, now);
            let breakdown = scorer.piece_breakdown(&pieces, now);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "project_id": project.id,
                    "name": project.name,
                    "report": report,
                    "pieces": breakdown,
                }))?
            );
        }
    }
    Ok(())
}
