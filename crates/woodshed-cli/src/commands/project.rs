//! Project management commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use uuid::Uuid;
use woodshed_core::{PieceRef, PracticeDb, Project};

use super::parse_date;

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Create a new project
    Create {
        /// Project name
        name: String,
        /// Concert date (YYYY-MM-DD or RFC3339)
        #[arg(long)]
        concert: Option<String>,
        /// Daily practice goal in minutes
        #[arg(long)]
        daily_goal: Option<i64>,
    },
    /// List projects
    List,
    /// Get project details
    Get {
        /// Project ID
        id: String,
    },
    /// Append a piece to the project programme
    AddPiece {
        /// Project ID
        id: String,
        /// Piece ID
        piece_id: String,
    },
    /// Remove a piece from the project programme
    RemovePiece {
        /// Project ID
        id: String,
        /// Piece ID
        piece_id: String,
    },
    /// Set or clear the concert date
    SetConcert {
        /// Project ID
        id: String,
        /// Concert date (YYYY-MM-DD or RFC3339); omit to clear
        #[arg(long)]
        date: Option<String>,
    },
    /// Set the daily practice goal
    SetGoal {
        /// Project ID
        id: String,
        /// Daily goal in minutes
        minutes: i64,
    },
    /// Delete a project (pieces and spots are untouched)
    Delete {
        /// Project ID
        id: String,
    },
}

pub fn run(action: ProjectAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = PracticeDb::open()?;

    match action {
        ProjectAction::Create {
            name,
            concert,
            daily_goal,
        } => {
            let mut project = Project::new(Uuid::new_v4().to_string(), name, Utc::now());
            project.concert_date = concert.as_deref().map(parse_date).transpose()?;
            project.daily_goal_minutes = daily_goal;
            db.create_project(&project)?;
            println!("Project created: {}", project.id);
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::List => {
            let projects = db.list_projects()?;
            println!("{}", serde_json::to_string_pretty(&projects)?);
        }
        ProjectAction::Get { id } => match db.get_project(&id)? {
            Some(project) => println!("{}", serde_json::to_string_pretty(&project)?),
            None => println!("Project not found: {id}"),
        },
        ProjectAction::AddPiece { id, piece_id } => {
            let mut project = db.get_project(&id)?.ok_or(format!("Project not found: {id}"))?;
            if db.get_piece(&piece_id)?.is_none() {
                return Err(format!("Piece not found: {piece_id}").into());
            }
            if project.pieces.iter().any(|p| p.piece_id == piece_id) {
                return Err(format!("Piece already in project: {piece_id}").into());
            }
            let position = project.pieces.len() as u32;
            project.pieces.push(PieceRef { piece_id, position });
            db.update_project(&project)?;
            println!("Project updated:");
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::RemovePiece { id, piece_id } => {
            let mut project = db.get_project(&id)?.ok_or(format!("Project not found: {id}"))?;
            project.pieces.retain(|p| p.piece_id != piece_id);
            for (position, piece) in project.pieces.iter_mut().enumerate() {
                piece.position = position as u32;
            }
            db.update_project(&project)?;
            println!("Project updated:");
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        ProjectAction::SetConcert { id, date } => {
            let mut project = db.get_project(&id)?.ok_or(format!("Project not found: {id}"))?;
            project.concert_date = date.as_deref().map(parse_date).transpose()?;
            db.update_project(&project)?;
            match project.concert_date {
                Some(date) => println!("Concert date set: {date}"),
                None => println!("Concert date cleared"),
            }
        }
        ProjectAction::SetGoal { id, minutes } => {
            let mut project = db.get_project(&id)?.ok_or(format!("Project not found: {id}"))?;
            project.daily_goal_minutes = Some(minutes);
            db.update_project(&project)?;
            println!("Daily goal set: {minutes} minutes");
        }
        ProjectAction::Delete { id } => {
            db.delete_project(&id)?;
            println!("Project deleted: {id}");
        }
    }
    Ok(())
}
