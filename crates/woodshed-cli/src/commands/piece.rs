//! Piece management commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use uuid::Uuid;
use woodshed_core::{Piece, PracticeDb};

#[derive(Subcommand)]
pub enum PieceAction {
    /// Create a new piece
    Create {
        /// Piece title
        title: String,
        /// Composer name
        #[arg(long)]
        composer: Option<String>,
        /// Difficulty 1-5 (default: 3)
        #[arg(long, default_value = "3")]
        difficulty: i32,
        /// Target tempo (BPM)
        #[arg(long)]
        target_tempo: Option<u32>,
    },
    /// List pieces
    List,
    /// Get piece details
    Get {
        /// Piece ID
        id: String,
    },
    /// Update a piece
    Update {
        /// Piece ID
        id: String,
        /// New title
        #[arg(long)]
        title: Option<String>,
        /// New composer
        #[arg(long)]
        composer: Option<String>,
        /// New difficulty
        #[arg(long)]
        difficulty: Option<i32>,
        /// New target tempo (BPM)
        #[arg(long)]
        target_tempo: Option<u32>,
        /// New current tempo (BPM)
        #[arg(long)]
        current_tempo: Option<u32>,
    },
    /// Delete a piece together with its spots and history
    Delete {
        /// Piece ID
        id: String,
    },
}

pub fn run(action: PieceAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = PracticeDb::open()?;

    match action {
        PieceAction::Create {
            title,
            composer,
            difficulty,
            target_tempo,
        } => {
            let mut piece = Piece::new(Uuid::new_v4().to_string(), title, Utc::now());
            piece.composer = composer;
            piece.difficulty = difficulty;
            piece.target_tempo = target_tempo;
            db.create_piece(&piece)?;
            println!("Piece created: {}", piece.id);
            println!("{}", serde_json::to_string_pretty(&piece)?);
        }
        PieceAction::List => {
            let pieces = db.list_pieces()?;
            println!("{}", serde_json::to_string_pretty(&pieces)?);
        }
        PieceAction::Get { id } => match db.get_piece(&id)? {
            Some(piece) => println!("{}", serde_json::to_string_pretty(&piece)?),
            None => println!("Piece not found: {id}"),
        },
        PieceAction::Update {
            id,
            title,
            composer,
            difficulty,
            target_tempo,
            current_tempo,
        } => {
            let mut piece = db.get_piece(&id)?.ok_or(format!("Piece not found: {id}"))?;

            if let Some(t) = title {
                piece.title = t;
            }
            if let Some(c) = composer {
                piece.composer = Some(c);
            }
            if let Some(d) = difficulty {
                piece.difficulty = d;
            }
            if let Some(t) = target_tempo {
                piece.target_tempo = Some(t);
            }
            if let Some(t) = current_tempo {
                piece.current_tempo = Some(t);
            }
            piece.updated_at = Utc::now();

            db.update_piece(&piece)?;
            println!("Piece updated:");
            println!("{}", serde_json::to_string_pretty(&piece)?);
        }
        PieceAction::Delete { id } => {
            db.delete_piece(&id)?;
            println!("Piece deleted: {id}");
        }
    }
    Ok(())
}
