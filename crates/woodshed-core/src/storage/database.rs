//! SQLite-based storage for pieces, spots, attempts, and projects.
//!
//! Scheduling fields on spots (`readiness`, `next_due`, `last_practiced`)
//! are only written through [`PracticeDb::record_attempt`], which runs the
//! scheduler and persists its output in one transaction. `update_spot`
//! covers explicit user edits (geometry, classification, metadata) and
//! leaves scheduling state alone.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{data_dir, migrations};
use crate::error::{CoreError, DatabaseError, Result};
use crate::repertoire::{Piece, PieceRef, Project};
use crate::spot::{
    ColorTag, PageRegion, PracticeAttempt, PracticeResult, Priority, ReadinessLevel, Spot,
};
use crate::srs::{ScheduleUpdate, SrsScheduler};

// === Helper Functions ===

/// Parse priority from database string
fn parse_priority(s: &str) -> Priority {
    match s {
        "low" => Priority::Low,
        "high" => Priority::High,
        _ => Priority::Medium,
    }
}

/// Format priority for database storage
fn format_priority(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "low",
        Priority::Medium => "medium",
        Priority::High => "high",
    }
}

/// Parse color tag from database string
fn parse_color(s: &str) -> ColorTag {
    match s {
        "red" => ColorTag::Red,
        "green" => ColorTag::Green,
        _ => ColorTag::Yellow,
    }
}

/// Format color tag for database storage
fn format_color(color: ColorTag) -> &'static str {
    match color {
        ColorTag::Red => "red",
        ColorTag::Yellow => "yellow",
        ColorTag::Green => "green",
    }
}

/// Parse readiness level from database string
fn parse_readiness(s: &str) -> ReadinessLevel {
    match s {
        "learning" => ReadinessLevel::Learning,
        "review" => ReadinessLevel::Review,
        "mastered" => ReadinessLevel::Mastered,
        _ => ReadinessLevel::New,
    }
}

/// Format readiness level for database storage
fn format_readiness(level: ReadinessLevel) -> &'static str {
    match level {
        ReadinessLevel::New => "new",
        ReadinessLevel::Learning => "learning",
        ReadinessLevel::Review => "review",
        ReadinessLevel::Mastered => "mastered",
    }
}

/// Parse practice result from database string
fn parse_result(s: &str) -> PracticeResult {
    match s {
        "failed" => PracticeResult::Failed,
        "struggled" => PracticeResult::Struggled,
        "excellent" => PracticeResult::Excellent,
        _ => PracticeResult::Good,
    }
}

/// Format practice result for database storage
fn format_result(result: PracticeResult) -> &'static str {
    match result {
        PracticeResult::Failed => "failed",
        PracticeResult::Struggled => "struggled",
        PracticeResult::Good => "good",
        PracticeResult::Excellent => "excellent",
    }
}

/// Parse an RFC3339 timestamp, falling back to now on corrupt data
fn parse_datetime_fallback(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

/// Parse an optional RFC3339 timestamp
fn parse_datetime_opt(s: Option<String>) -> Option<DateTime<Utc>> {
    s.and_then(|s| DateTime::parse_from_rfc3339(&s).ok())
        .map(|dt| dt.with_timezone(&Utc))
}

fn map_piece_row(row: &Row) -> rusqlite::Result<Piece> {
    Ok(Piece {
        id: row.get(0)?,
        title: row.get(1)?,
        composer: row.get(2)?,
        difficulty: row.get(3)?,
        target_tempo: row.get(4)?,
        current_tempo: row.get(5)?,
        total_practice_minutes: row.get(6)?,
        created_at: parse_datetime_fallback(&row.get::<_, String>(7)?),
        updated_at: parse_datetime_fallback(&row.get::<_, String>(8)?),
    })
}

/// Map a spot row, without its history (attached separately).
fn map_spot_row(row: &Row) -> rusqlite::Result<Spot> {
    let priority_str: String = row.get(7)?;
    let color_str: String = row.get(8)?;
    let readiness_str: String = row.get(10)?;
    let active: i32 = row.get(14)?;

    Ok(Spot {
        id: row.get(0)?,
        piece_id: row.get(1)?,
        page: row.get(2)?,
        region: PageRegion {
            x: row.get(3)?,
            y: row.get(4)?,
            width: row.get(5)?,
            height: row.get(6)?,
        },
        priority: parse_priority(&priority_str),
        color: parse_color(&color_str),
        difficulty: row.get(9)?,
        readiness: parse_readiness(&readiness_str),
        last_practiced: parse_datetime_opt(row.get(11)?),
        next_due: parse_datetime_opt(row.get(12)?),
        recommended_minutes: row.get(13)?,
        history: Vec::new(),
        active: active != 0,
        created_at: parse_datetime_fallback(&row.get::<_, String>(15)?),
        updated_at: parse_datetime_fallback(&row.get::<_, String>(16)?),
    })
}

const SPOT_COLUMNS: &str = "id, piece_id, page, x, y, width, height, priority, color,
             difficulty, readiness, last_practiced, next_due, recommended_minutes,
             active, created_at, updated_at";

/// SQLite practice database.
pub struct PracticeDb {
    conn: Connection,
}

impl PracticeDb {
    /// Open (and migrate) the database at the default location,
    /// `~/.config/woodshed/practice.db`.
    pub fn open() -> Result<Self> {
        Self::open_at(&data_dir()?.join("practice.db"))
    }

    /// Open (and migrate) a database at an explicit path.
    pub fn open_at(path: &std::path::Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Open an in-memory database, for tests.
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(DatabaseError::from)?;
        migrations::migrate(&conn)
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(Self { conn })
    }

    // === Pieces ===

    /// Insert a new piece.
    pub fn create_piece(&self, piece: &Piece) -> Result<()> {
        self.conn.execute(
            "INSERT INTO pieces (id, title, composer, difficulty, target_tempo,
                                 current_tempo, total_practice_minutes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                piece.id,
                piece.title,
                piece.composer,
                piece.difficulty,
                piece.target_tempo,
                piece.current_tempo,
                piece.total_practice_minutes,
                piece.created_at.to_rfc3339(),
                piece.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a piece by id.
    pub fn get_piece(&self, id: &str) -> Result<Option<Piece>> {
        let piece = self
            .conn
            .query_row(
                "SELECT id, title, composer, difficulty, target_tempo, current_tempo,
                        total_practice_minutes, created_at, updated_at
                 FROM pieces WHERE id = ?1",
                params![id],
                map_piece_row,
            )
            .optional()
            .map_err(DatabaseError::from)?;
        Ok(piece)
    }

    /// List all pieces, ordered by title.
    pub fn list_pieces(&self) -> Result<Vec<Piece>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, composer, difficulty, target_tempo, current_tempo,
                    total_practice_minutes, created_at, updated_at
             FROM pieces ORDER BY title",
        )?;
        let pieces = stmt
            .query_map([], map_piece_row)?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::from)?;
        Ok(pieces)
    }

    /// Update a piece's metadata.
    pub fn update_piece(&self, piece: &Piece) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE pieces SET title = ?1, composer = ?2, difficulty = ?3,
                    target_tempo = ?4, current_tempo = ?5,
                    total_practice_minutes = ?6, updated_at = ?7
             WHERE id = ?8",
            params![
                piece.title,
                piece.composer,
                piece.difficulty,
                piece.target_tempo,
                piece.current_tempo,
                piece.total_practice_minutes,
                piece.updated_at.to_rfc3339(),
                piece.id,
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                kind: "Piece",
                id: piece.id.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Delete a piece together with its spots and their history.
    pub fn delete_piece(&mut self, id: &str) -> Result<()> {
        let tx = self.conn.transaction().map_err(DatabaseError::from)?;
        tx.execute(
            "DELETE FROM attempts WHERE spot_id IN (SELECT id FROM spots WHERE piece_id = ?1)",
            params![id],
        )?;
        tx.execute("DELETE FROM spots WHERE piece_id = ?1", params![id])?;
        tx.execute("DELETE FROM project_pieces WHERE piece_id = ?1", params![id])?;
        tx.execute("DELETE FROM pieces WHERE id = ?1", params![id])?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok(())
    }

    // === Spots ===

    /// Insert a new spot. The spot is validated before insertion.
    pub fn create_spot(&self, spot: &Spot) -> Result<()> {
        spot.validate()?;
        self.conn.execute(
            "INSERT INTO spots (id, piece_id, page, x, y, width, height, priority,
                                color, difficulty, readiness, last_practiced, next_due,
                                recommended_minutes, active, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                spot.id,
                spot.piece_id,
                spot.page,
                spot.region.x,
                spot.region.y,
                spot.region.width,
                spot.region.height,
                format_priority(spot.priority),
                format_color(spot.color),
                spot.difficulty,
                format_readiness(spot.readiness),
                spot.last_practiced.map(|dt| dt.to_rfc3339()),
                spot.next_due.map(|dt| dt.to_rfc3339()),
                spot.recommended_minutes,
                spot.active as i32,
                spot.created_at.to_rfc3339(),
                spot.updated_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    /// Fetch a spot by id, with its full history (oldest first).
    pub fn get_spot(&self, id: &str) -> Result<Option<Spot>> {
        let sql = format!("SELECT {SPOT_COLUMNS} FROM spots WHERE id = ?1");
        let spot = self
            .conn
            .query_row(&sql, params![id], map_spot_row)
            .optional()
            .map_err(DatabaseError::from)?;

        match spot {
            Some(mut spot) => {
                spot.history = self.attempts_for(&spot.id)?;
                Ok(Some(spot))
            }
            None => Ok(None),
        }
    }

    /// List spots, optionally scoped to one piece. Inactive spots are
    /// included only when requested (analytics want them, scheduling
    /// views do not).
    pub fn list_spots(&self, piece_id: Option<&str>, include_inactive: bool) -> Result<Vec<Spot>> {
        let mut sql = format!("SELECT {SPOT_COLUMNS} FROM spots");
        let mut clauses = Vec::new();
        if piece_id.is_some() {
            clauses.push("piece_id = ?1");
        }
        if !include_inactive {
            clauses.push("active = 1");
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY piece_id, page, id");

        let mut stmt = self.conn.prepare(&sql)?;
        let mut spots = match piece_id {
            Some(piece_id) => stmt
                .query_map(params![piece_id], map_spot_row)?
                .collect::<rusqlite::Result<Vec<_>>>(),
            None => stmt
                .query_map([], map_spot_row)?
                .collect::<rusqlite::Result<Vec<_>>>(),
        }
        .map_err(DatabaseError::from)?;

        for spot in spots.iter_mut() {
            spot.history = self.attempts_for(&spot.id)?;
        }
        Ok(spots)
    }

    /// Apply an explicit user edit to a spot: geometry, classification
    /// and recommended duration. Scheduling state is not touched here.
    pub fn update_spot(&self, spot: &Spot) -> Result<()> {
        spot.validate()?;
        let changed = self.conn.execute(
            "UPDATE spots SET page = ?1, x = ?2, y = ?3, width = ?4, height = ?5,
                    priority = ?6, color = ?7, difficulty = ?8,
                    recommended_minutes = ?9, updated_at = ?10
             WHERE id = ?11",
            params![
                spot.page,
                spot.region.x,
                spot.region.y,
                spot.region.width,
                spot.region.height,
                format_priority(spot.priority),
                format_color(spot.color),
                spot.difficulty,
                spot.recommended_minutes,
                spot.updated_at.to_rfc3339(),
                spot.id,
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                kind: "Spot",
                id: spot.id.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Soft-delete or restore a spot. History is preserved either way.
    pub fn set_spot_active(&self, id: &str, active: bool) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE spots SET active = ?1, updated_at = ?2 WHERE id = ?3",
            params![active as i32, Utc::now().to_rfc3339(), id],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                kind: "Spot",
                id: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    /// Record a practice outcome: run the scheduler over the current
    /// snapshot, then persist the attempt and the scheduling update in
    /// one transaction. Returns the updated spot and the update applied.
    pub fn record_attempt(
        &mut self,
        spot_id: &str,
        result: PracticeResult,
        duration_minutes: i64,
        now: DateTime<Utc>,
        concert_date: Option<DateTime<Utc>>,
        scheduler: &SrsScheduler,
    ) -> Result<(Spot, ScheduleUpdate)> {
        let attempt = PracticeAttempt {
            at: now,
            duration_minutes,
            result,
        };
        attempt.validate()?;

        let mut spot = self.get_spot(spot_id)?.ok_or(DatabaseError::NotFound {
            kind: "Spot",
            id: spot_id.to_string(),
        })?;

        let update = scheduler.record_outcome(&spot, result, now, concert_date)?;

        let tx = self.conn.transaction().map_err(DatabaseError::from)?;
        tx.execute(
            "INSERT INTO attempts (spot_id, at, duration_minutes, result)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                spot_id,
                now.to_rfc3339(),
                duration_minutes,
                format_result(result)
            ],
        )?;
        tx.execute(
            "UPDATE spots SET readiness = ?1, last_practiced = ?2, next_due = ?3,
                    updated_at = ?2
             WHERE id = ?4",
            params![
                format_readiness(update.readiness),
                now.to_rfc3339(),
                update.next_due.to_rfc3339(),
                spot_id,
            ],
        )?;
        tx.execute(
            "UPDATE pieces SET total_practice_minutes = total_practice_minutes + ?1,
                    updated_at = ?2
             WHERE id = ?3",
            params![duration_minutes, now.to_rfc3339(), spot.piece_id],
        )?;
        tx.commit().map_err(DatabaseError::from)?;

        spot.history.push(attempt);
        spot.readiness = update.readiness;
        spot.last_practiced = Some(now);
        spot.next_due = Some(update.next_due);
        spot.updated_at = now;

        Ok((spot, update))
    }

    fn attempts_for(&self, spot_id: &str) -> Result<Vec<PracticeAttempt>> {
        let mut stmt = self.conn.prepare(
            "SELECT at, duration_minutes, result FROM attempts
             WHERE spot_id = ?1 ORDER BY at, id",
        )?;
        let attempts = stmt
            .query_map(params![spot_id], |row| {
                let result_str: String = row.get(2)?;
                Ok(PracticeAttempt {
                    at: parse_datetime_fallback(&row.get::<_, String>(0)?),
                    duration_minutes: row.get(1)?,
                    result: parse_result(&result_str),
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::from)?;
        Ok(attempts)
    }

    // === Projects ===

    /// Insert a new project with its piece references.
    pub fn create_project(&mut self, project: &Project) -> Result<()> {
        let tx = self.conn.transaction().map_err(DatabaseError::from)?;
        tx.execute(
            "INSERT INTO projects (id, name, concert_date, daily_goal_minutes, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                project.id,
                project.name,
                project.concert_date.map(|dt| dt.to_rfc3339()),
                project.daily_goal_minutes,
                project.created_at.to_rfc3339(),
            ],
        )?;
        for piece in &project.pieces {
            tx.execute(
                "INSERT INTO project_pieces (project_id, piece_id, position)
                 VALUES (?1, ?2, ?3)",
                params![project.id, piece.piece_id, piece.position],
            )?;
        }
        tx.commit().map_err(DatabaseError::from)?;
        Ok(())
    }

    /// Fetch a project by id, with piece references in programme order.
    pub fn get_project(&self, id: &str) -> Result<Option<Project>> {
        let project = self
            .conn
            .query_row(
                "SELECT id, name, concert_date, daily_goal_minutes, created_at
                 FROM projects WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Project {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        concert_date: parse_datetime_opt(row.get(2)?),
                        daily_goal_minutes: row.get(3)?,
                        pieces: Vec::new(),
                        created_at: parse_datetime_fallback(&row.get::<_, String>(4)?),
                    })
                },
            )
            .optional()
            .map_err(DatabaseError::from)?;

        match project {
            Some(mut project) => {
                let mut stmt = self.conn.prepare(
                    "SELECT piece_id, position FROM project_pieces
                     WHERE project_id = ?1 ORDER BY position",
                )?;
                project.pieces = stmt
                    .query_map(params![project.id], |row| {
                        Ok(PieceRef {
                            piece_id: row.get(0)?,
                            position: row.get(1)?,
                        })
                    })?
                    .collect::<rusqlite::Result<Vec<_>>>()
                    .map_err(DatabaseError::from)?;
                Ok(Some(project))
            }
            None => Ok(None),
        }
    }

    /// List all projects, ordered by name, with piece references.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id FROM projects ORDER BY name")?;
        let ids = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(DatabaseError::from)?;

        let mut projects = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(project) = self.get_project(&id)? {
                projects.push(project);
            }
        }
        Ok(projects)
    }

    /// Update a project's metadata and replace its piece references.
    pub fn update_project(&mut self, project: &Project) -> Result<()> {
        let tx = self.conn.transaction().map_err(DatabaseError::from)?;
        let changed = tx.execute(
            "UPDATE projects SET name = ?1, concert_date = ?2, daily_goal_minutes = ?3
             WHERE id = ?4",
            params![
                project.name,
                project.concert_date.map(|dt| dt.to_rfc3339()),
                project.daily_goal_minutes,
                project.id,
            ],
        )?;
        if changed == 0 {
            return Err(DatabaseError::NotFound {
                kind: "Project",
                id: project.id.clone(),
            }
            .into());
        }
        tx.execute(
            "DELETE FROM project_pieces WHERE project_id = ?1",
            params![project.id],
        )?;
        for piece in &project.pieces {
            tx.execute(
                "INSERT INTO project_pieces (project_id, piece_id, position)
                 VALUES (?1, ?2, ?3)",
                params![project.id, piece.piece_id, piece.position],
            )?;
        }
        tx.commit().map_err(DatabaseError::from)?;
        Ok(())
    }

    /// Delete a project. Pieces and spots are untouched.
    pub fn delete_project(&mut self, id: &str) -> Result<()> {
        let tx = self.conn.transaction().map_err(DatabaseError::from)?;
        tx.execute(
            "DELETE FROM project_pieces WHERE project_id = ?1",
            params![id],
        )?;
        tx.execute("DELETE FROM projects WHERE id = ?1", params![id])?;
        tx.commit().map_err(DatabaseError::from)?;
        Ok(())
    }

    /// Load a project's pieces with all their spots (history included),
    /// in programme order. The shape the readiness scorer consumes.
    pub fn project_pieces_with_spots(
        &self,
        project: &Project,
    ) -> Result<Vec<(Piece, Vec<Spot>)>> {
        let mut pieces = Vec::with_capacity(project.pieces.len());
        for piece_ref in &project.pieces {
            let piece = self.get_piece(&piece_ref.piece_id)?.ok_or_else(|| {
                CoreError::from(DatabaseError::NotFound {
                    kind: "Piece",
                    id: piece_ref.piece_id.clone(),
                })
            })?;
            let spots = self.list_spots(Some(&piece.id), true)?;
            pieces.push((piece, spots));
        }
        Ok(pieces)
    }
}
