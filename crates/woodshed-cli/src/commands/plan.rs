//! Session planning command for CLI.

use chrono::Utc;
use clap::Args;
use woodshed_core::{Config, PlanOutcome, PracticeDb, SessionPlanner, SessionStrategy, Spot};

#[derive(Args)]
pub struct PlanArgs {
    /// Plan over one piece's spots
    #[arg(long, conflicts_with = "project")]
    pub piece: Option<String>,
    /// Plan over a project's programme (uses its concert date and daily
    /// goal)
    #[arg(long)]
    pub project: Option<String>,
    /// Target session length in minutes (default: project goal, then
    /// config)
    #[arg(long)]
    pub minutes: Option<i64>,
    /// Alternate spots across pieces
    #[arg(long)]
    pub interleave: bool,
    /// Keep spots grouped by piece
    #[arg(long, conflicts_with = "interleave")]
    pub blocked: bool,
    /// Skip microbreak rest markers
    #[arg(long)]
    pub no_microbreaks: bool,
}

pub fn run(args: PlanArgs) -> Result<(), Box<dyn std::error::Error>> {
    let db = PracticeDb::open()?;
    let config = Config::load_or_default();
    let now = Utc::now();

    let mut concert_date = None;
    let mut goal_minutes = None;

    let pool: Vec<Spot> = if let Some(project_id) = &args.project {
        let project = db
            .get_project(project_id)?
            .ok_or(format!("Project not found: {project_id}"))?;
        concert_date = project.concert_date;
        goal_minutes = project.daily_goal_minutes;

        let mut pool = Vec::new();
        for piece_ref in &project.pieces {
            pool.extend(db.list_spots(Some(&piece_ref.piece_id), false)?);
        }
        pool
    } else if let Some(piece_id) = &args.piece {
        if db.get_piece(piece_id)?.is_none() {
            return Err(format!("Piece not found: {piece_id}").into());
        }
        db.list_spots(Some(piece_id), false)?
    } else {
        db.list_spots(None, false)?
    };

    let target_minutes = args
        .minutes
        .or(goal_minutes)
        .unwrap_or(config.session.default_target_minutes);

    let mut strategy = config.strategy();
    if args.interleave {
        strategy.interleave = true;
    }
    if args.blocked {
        strategy.interleave = false;
    }
    if args.no_microbreaks {
        strategy.microbreaks = false;
    }

    let planner = SessionPlanner::new(config.scheduler()).with_config(config.planner_config());
    let outcome = planner.plan(&pool, now, target_minutes, strategy, concert_date);

    match &outcome {
        PlanOutcome::Session(plan) => {
            println!(
                "Planned {} minutes of practice ({} minutes rest)",
                plan.total_practice_minutes, plan.total_rest_minutes
            );
            println!("{}", serde_json::to_string_pretty(plan)?);
        }
        PlanOutcome::Empty { reason } => {
            println!("No session planned: {}", reason.message());
        }
    }
    Ok(())
}
