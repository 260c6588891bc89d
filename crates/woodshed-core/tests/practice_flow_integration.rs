//! End-to-end integration tests: storage, scheduler, readiness and
//! planner working together the way the CLI drives them.

use chrono::{Duration, Utc};
use woodshed_core::{
    ColorTag, Config, PageRegion, PieceRef, Piece, PlanItem, PlanOutcome, PracticeAnalyzer,
    PracticeDb, PracticeResult, Project, ReadinessLevel, ReadinessScorer, SessionPlanner,
    SessionStrategy, Spot, SrsScheduler,
};

fn seed_piece(db: &PracticeDb, id: &str, title: &str) -> Piece {
    let piece = Piece::new(id.to_string(), title.to_string(), Utc::now());
    db.create_piece(&piece).unwrap();
    piece
}

fn seed_spot(db: &PracticeDb, id: &str, piece_id: &str, color: ColorTag) -> Spot {
    let mut spot = Spot::new(
        id.to_string(),
        piece_id.to_string(),
        1,
        PageRegion {
            x: 0.1,
            y: 0.1,
            width: 0.25,
            height: 0.1,
        },
        Utc::now(),
    );
    spot.color = color;
    spot.recommended_minutes = 10;
    db.create_spot(&spot).unwrap();
    spot
}

#[test]
fn practice_cycle_advances_readiness_and_reschedules() {
    let mut db = PracticeDb::open_memory().unwrap();
    let scheduler = SrsScheduler::new();
    seed_piece(&db, "p1", "Clair de Lune");
    seed_spot(&db, "s1", "p1", ColorTag::Yellow);

    let now = Utc::now();

    // New spot is due immediately
    let fresh = db.get_spot("s1").unwrap().unwrap();
    assert!(fresh.is_due(now));

    // First excellent outcome: new -> learning, due in 3 days (standard)
    let (spot, update) = db
        .record_attempt("s1", PracticeResult::Excellent, 12, now, None, &scheduler)
        .unwrap();
    assert_eq!(update.readiness, ReadinessLevel::Learning);
    assert!(!spot.is_due(now + Duration::days(1)));
    assert!(spot.is_due(now + Duration::days(4)));

    // A failure regresses back to new and shortens the interval
    let later = now + Duration::days(4);
    let (spot, update) = db
        .record_attempt("s1", PracticeResult::Failed, 6, later, None, &scheduler)
        .unwrap();
    assert_eq!(update.readiness, ReadinessLevel::New);
    assert_eq!(spot.history.len(), 2);
    assert!(spot.is_due(later + Duration::days(2)));

    // History is append-only and ordered
    let loaded = db.get_spot("s1").unwrap().unwrap();
    assert_eq!(loaded.history.len(), 2);
    assert!(loaded.history[0].at <= loaded.history[1].at);
}

#[test]
fn concert_project_readiness_report() {
    let mut db = PracticeDb::open_memory().unwrap();
    let scorer = ReadinessScorer::new();
    let now = Utc::now();

    seed_piece(&db, "p1", "Clair de Lune");
    seed_spot(&db, "s1", "p1", ColorTag::Red);
    seed_spot(&db, "s2", "p1", ColorTag::Red);

    let mut project = Project::new("proj1".to_string(), "Spring Recital".to_string(), now);
    project.concert_date = Some(now + Duration::days(3));
    project.pieces = vec![PieceRef {
        piece_id: "p1".to_string(),
        position: 0,
    }];
    db.create_project(&project).unwrap();

    let loaded = db.get_project("proj1").unwrap().unwrap();
    let pieces = db.project_pieces_with_spots(&loaded).unwrap();
    let report = scorer.project_readiness(&loaded, &pieces, now);

    // Deadline-driven branch, not the maintenance default
    assert!(report.recommendations[0].contains("Concert in 3 days"));
    assert!(report
        .recommendations
        .iter()
        .any(|r| r.contains("Clair de Lune") && r.contains("critical")));
    assert!(!report
        .recommendations
        .iter()
        .any(|r| r.contains("muscle memory")));
}

#[test]
fn session_planning_over_stored_spots() {
    let mut db = PracticeDb::open_memory().unwrap();
    let config = Config::default();
    let scheduler = config.scheduler();
    let now = Utc::now();

    seed_piece(&db, "p1", "Clair de Lune");
    seed_piece(&db, "p2", "Arabesque No. 1");
    seed_spot(&db, "a1", "p1", ColorTag::Yellow);
    seed_spot(&db, "a2", "p1", ColorTag::Yellow);
    seed_spot(&db, "b1", "p2", ColorTag::Yellow);

    // Build up distinct overdue-ness through recorded outcomes
    db.record_attempt("a1", PracticeResult::Good, 10, now - Duration::days(9), None, &scheduler)
        .unwrap();
    db.record_attempt("b1", PracticeResult::Good, 10, now - Duration::days(6), None, &scheduler)
        .unwrap();

    let pool = db.list_spots(None, false).unwrap();
    let planner = SessionPlanner::new(scheduler).with_config(config.planner_config());
    let strategy = SessionStrategy {
        interleave: true,
        microbreaks: false,
    };
    let outcome = planner.plan(&pool, now, 30, strategy, None);
    let plan = outcome.session().expect("expected a planned session");

    assert_eq!(plan.total_practice_minutes, 30);
    let practiced: Vec<&str> = plan
        .items
        .iter()
        .filter_map(|item| match item {
            PlanItem::Practice { spot_id, .. } => Some(spot_id.as_str()),
            PlanItem::Rest { .. } => None,
        })
        .collect();
    assert_eq!(practiced.len(), 3);
    // a1 is the most overdue, so piece p1 leads the interleave
    assert_eq!(practiced[0], "a1");

    // Deactivated spots drop out of planning but keep their history
    db.set_spot_active("a1", false).unwrap();
    db.set_spot_active("a2", false).unwrap();
    db.set_spot_active("b1", false).unwrap();
    let empty_pool = db.list_spots(None, false).unwrap();
    let outcome = planner.plan(&empty_pool, now, 30, strategy, None);
    assert!(matches!(outcome, PlanOutcome::Empty { .. }));

    let analyzer = PracticeAnalyzer::new();
    let all = db.list_spots(None, true).unwrap();
    let overview = analyzer.overview(&all, now);
    assert_eq!(overview.total_practice_minutes, 20);
    assert_eq!(overview.inactive_spots, 3);
}
