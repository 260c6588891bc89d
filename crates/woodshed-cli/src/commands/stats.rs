//! Practice statistics commands for CLI.

use chrono::Utc;
use clap::Subcommand;
use woodshed_core::{PracticeAnalyzer, PracticeDb};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Aggregate overview (optionally scoped to one piece)
    Overview {
        /// Piece ID
        #[arg(long)]
        piece: Option<String>,
    },
    /// Minutes practiced per day
    Daily {
        /// How many days back to include
        #[arg(long, default_value = "7")]
        days: u32,
        /// Piece ID
        #[arg(long)]
        piece: Option<String>,
    },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = PracticeDb::open()?;
    let analyzer = PracticeAnalyzer::new();
    let now = Utc::now();

    match action {
        StatsAction::Overview { piece } => {
            let spots = db.list_spots(piece.as_deref(), true)?;
            let overview = analyzer.overview(&spots, now);
            println!("{}", serde_json::to_string_pretty(&overview)?);
        }
        StatsAction::Daily { days, piece } => {
            let spots = db.list_spots(piece.as_deref(), true)?;
            let daily = analyzer.daily_minutes(&spots, days, now);
            println!("{}", serde_json::to_string_pretty(&daily)?);
        }
    }
    Ok(())
}
