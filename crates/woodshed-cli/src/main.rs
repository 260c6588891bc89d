use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "woodshed-cli", version, about = "Woodshed CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Piece management
    Piece {
        #[command(subcommand)]
        action: commands::piece::PieceAction,
    },
    /// Practice spot management
    Spot {
        #[command(subcommand)]
        action: commands::spot::SpotAction,
    },
    /// Project management
    Project {
        #[command(subcommand)]
        action: commands::project::ProjectAction,
    },
    /// Readiness reports
    Readiness {
        #[command(subcommand)]
        action: commands::readiness::ReadinessAction,
    },
    /// Practice session planning
    Plan(commands::plan::PlanArgs),
    /// Practice statistics
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Piece { action } => commands::piece::run(action),
        Commands::Spot { action } => commands::spot::run(action),
        Commands::Project { action } => commands::project::run(action),
        Commands::Readiness { action } => commands::readiness::run(action),
        Commands::Plan(args) => commands::plan::run(args),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
