//! Practice spot commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use uuid::Uuid;
use woodshed_core::{Config, PageRegion, PracticeDb, Spot};

use super::{parse_color, parse_priority, parse_result};

#[derive(Subcommand)]
pub enum SpotAction {
    /// Mark a new spot on a piece
    Add {
        /// Owning piece ID
        piece_id: String,
        /// Page number (1-based)
        #[arg(long, default_value = "1")]
        page: u32,
        /// Normalized left edge (0-1)
        #[arg(long)]
        x: f64,
        /// Normalized top edge (0-1)
        #[arg(long)]
        y: f64,
        /// Normalized width (0-1)
        #[arg(long)]
        width: f64,
        /// Normalized height (0-1)
        #[arg(long)]
        height: f64,
        /// Priority: low, medium or high
        #[arg(long, default_value = "medium")]
        priority: String,
        /// Color tag: red, yellow or green
        #[arg(long, default_value = "yellow")]
        color: String,
        /// Difficulty 1-5
        #[arg(long, default_value = "3")]
        difficulty: i32,
        /// Recommended practice minutes per session
        #[arg(long, default_value = "10")]
        minutes: i64,
    },
    /// List spots
    List {
        /// Filter by piece ID
        #[arg(long)]
        piece: Option<String>,
        /// Include soft-deleted spots
        #[arg(long)]
        all: bool,
    },
    /// Get spot details, including history
    Get {
        /// Spot ID
        id: String,
    },
    /// Edit a spot's geometry or classification
    Edit {
        /// Spot ID
        id: String,
        /// New page number
        #[arg(long)]
        page: Option<u32>,
        /// New left edge (0-1)
        #[arg(long)]
        x: Option<f64>,
        /// New top edge (0-1)
        #[arg(long)]
        y: Option<f64>,
        /// New width (0-1)
        #[arg(long)]
        width: Option<f64>,
        /// New height (0-1)
        #[arg(long)]
        height: Option<f64>,
        /// New priority
        #[arg(long)]
        priority: Option<String>,
        /// New color tag
        #[arg(long)]
        color: Option<String>,
        /// New difficulty
        #[arg(long)]
        difficulty: Option<i32>,
        /// New recommended minutes
        #[arg(long)]
        minutes: Option<i64>,
    },
    /// Record a practice outcome for a spot
    Record {
        /// Spot ID
        id: String,
        /// Outcome: failed, struggled, good or excellent
        result: String,
        /// How long the attempt took, in minutes
        #[arg(long)]
        minutes: i64,
        /// Project whose concert date should clamp scheduling
        #[arg(long)]
        project: Option<String>,
    },
    /// Soft-delete a spot (history is preserved)
    Deactivate {
        /// Spot ID
        id: String,
    },
    /// Restore a soft-deleted spot
    Reactivate {
        /// Spot ID
        id: String,
    },
}

pub fn run(action: SpotAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = PracticeDb::open()?;

    match action {
        SpotAction::Add {
            piece_id,
            page,
            x,
            y,
            width,
            height,
            priority,
            color,
            difficulty,
            minutes,
        } => {
            if db.get_piece(&piece_id)?.is_none() {
                return Err(format!("Piece not found: {piece_id}").into());
            }
            let mut spot = Spot::new(
                Uuid::new_v4().to_string(),
                piece_id,
                page,
                PageRegion {
                    x,
                    y,
                    width,
                    height,
                },
                Utc::now(),
            );
            spot.priority = parse_priority(&priority)?;
            spot.color = parse_color(&color)?;
            spot.difficulty = difficulty;
            spot.recommended_minutes = minutes;
            db.create_spot(&spot)?;
            println!("Spot created: {}", spot.id);
            println!("{}", serde_json::to_string_pretty(&spot)?);
        }
        SpotAction::List { piece, all } => {
            let spots = db.list_spots(piece.as_deref(), all)?;
            println!("{}", serde_json::to_string_pretty(&spots)?);
        }
        SpotAction::Get { id } => match db.get_spot(&id)? {
            Some(spot) => println!("{}", serde_json::to_string_pretty(&spot)?),
            None => println!("Spot not found: {id}"),
        },
        SpotAction::Edit {
            id,
            page,
            x,
            y,
            width,
            height,
            priority,
            color,
            difficulty,
            minutes,
        } => {
            let mut spot = db.get_spot(&id)?.ok_or(format!("Spot not found: {id}"))?;

            if let Some(p) = page {
                spot.page = p;
            }
            if let Some(v) = x {
                spot.region.x = v;
            }
            if let Some(v) = y {
                spot.region.y = v;
            }
            if let Some(v) = width {
                spot.region.width = v;
            }
            if let Some(v) = height {
                spot.region.height = v;
            }
            if let Some(p) = priority {
                spot.priority = parse_priority(&p)?;
            }
            if let Some(c) = color {
                spot.color = parse_color(&c)?;
            }
            if let Some(d) = difficulty {
                spot.difficulty = d;
            }
            if let Some(m) = minutes {
                spot.recommended_minutes = m;
            }
            spot.updated_at = Utc::now();

            db.update_spot(&spot)?;
            println!("Spot updated:");
            println!("{}", serde_json::to_string_pretty(&spot)?);
        }
        SpotAction::Record {
            id,
            result,
            minutes,
            project,
        } => {
            let result = parse_result(&result)?;
            let concert_date = match project {
                Some(project_id) => db
                    .get_project(&project_id)?
                    .ok_or(format!("Project not found: {project_id}"))?
                    .concert_date,
                None => None,
            };

            let config = Config::load_or_default();
            let scheduler = config.scheduler();
            let (spot, update) =
                db.record_attempt(&id, result, minutes, Utc::now(), concert_date, &scheduler)?;

            println!(
                "Outcome recorded: {} is now {:?}, due {}",
                spot.id, update.readiness, update.next_due
            );
            println!("{}", serde_json::to_string_pretty(&spot)?);
        }
        SpotAction::Deactivate { id } => {
            db.set_spot_active(&id, false)?;
            println!("Spot deactivated: {id}");
        }
        SpotAction::Reactivate { id } => {
            db.set_spot_active(&id, true)?;
            println!("Spot reactivated: {id}");
        }
    }
    Ok(())
}
