use std::path::Path;

use bevy_utils::tracing::debug;
use rusqlite::{params, Connection, OptionalExtension};

use crate::components::actor::ActorId;
use crate::data::criteria::{CriterionId, TreeId};
use crate::simulation::progress::ProgressRecord;
use crate::simulation::tracker::ActorCriteria;

const PROGRESS_SCHEMA_VERSION: i64 = 1;

const PROGRESS_DB_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS criteria_meta (
  id INTEGER PRIMARY KEY CHECK (id = 1),
  schema_version INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS criteria_progress (
  actor_id INTEGER NOT NULL,
  criterion_id INTEGER NOT NULL,
  counter INTEGER NOT NULL,
  updated_at INTEGER NOT NULL,
  owner_id INTEGER NOT NULL,
  PRIMARY KEY (actor_id, criterion_id)
);

CREATE TABLE IF NOT EXISTS criteria_timers (
  actor_id INTEGER NOT NULL,
  tree_id INTEGER NOT NULL,
  remaining_ms INTEGER NOT NULL,
  PRIMARY KEY (actor_id, tree_id)
);

CREATE TABLE IF NOT EXISTS criteria_completed (
  actor_id INTEGER NOT NULL,
  tree_id INTEGER NOT NULL,
  PRIMARY KEY (actor_id, tree_id)
);
"#;

#[derive(Debug)]
pub enum ProgressDbError {
    Sqlite(rusqlite::Error),
    InvalidData(String),
}

impl std::fmt::Display for ProgressDbError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProgressDbError::Sqlite(err) => write!(f, "sqlite error: {}", err),
            ProgressDbError::InvalidData(message) => write!(f, "{}", message),
        }
    }
}

impl std::error::Error for ProgressDbError {}

impl From<rusqlite::Error> for ProgressDbError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Sqlite(err)
    }
}

/// SQLite integers are signed; counters keep their bit pattern, so values past
/// `i64::MAX` are stored negative.
fn counter_to_sql(counter: u64) -> i64 {
    counter as i64
}

fn counter_from_sql(value: i64) -> u64 {
    value as u64
}

fn actor_to_sql(actor: ActorId) -> i64 {
    actor.0 as i64
}

pub struct SqliteProgressDb {
    conn: Connection,
}

impl SqliteProgressDb {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ProgressDbError> {
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, ProgressDbError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, ProgressDbError> {
        let mut db = Self { conn };
        db.conn.execute_batch(PROGRESS_DB_SCHEMA)?;
        db.ensure_meta()?;
        Ok(db)
    }

    fn ensure_meta(&mut self) -> Result<(), ProgressDbError> {
        let version = self
            .conn
            .query_row(
                "SELECT schema_version FROM criteria_meta WHERE id = 1",
                [],
                |row| row.get::<_, i64>(0),
            )
            .optional()?;

        match version {
            Some(PROGRESS_SCHEMA_VERSION) => Ok(()),
            Some(other) => Err(ProgressDbError::InvalidData(format!(
                "criteria_meta version mismatch (schema {}, expected {})",
                other, PROGRESS_SCHEMA_VERSION
            ))),
            None => {
                self.conn.execute(
                    "INSERT INTO criteria_meta (id, schema_version) VALUES (1, ?1)",
                    params![PROGRESS_SCHEMA_VERSION],
                )?;
                Ok(())
            }
        }
    }

    pub fn load_actor(&self, actor: ActorId) -> Result<ActorCriteria, ProgressDbError> {
        let mut state = ActorCriteria::new(actor);
        let actor_key = actor_to_sql(actor);

        let mut stmt = self.conn.prepare(
            "SELECT criterion_id, counter, updated_at, owner_id FROM criteria_progress WHERE actor_id = ?1",
        )?;
        let rows = stmt.query_map(params![actor_key], |row| {
            Ok((
                row.get::<_, i64>(0)? as u32,
                row.get::<_, i64>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)? as u64,
            ))
        })?;
        for row in rows {
            let (criterion, counter, updated_at, owner) = row?;
            state.progress.restore(
                CriterionId(criterion),
                ProgressRecord {
                    counter: counter_from_sql(counter),
                    updated_at,
                    owner: ActorId(owner),
                    unsaved: false,
                },
            );
        }

        let mut stmt = self
            .conn
            .prepare("SELECT tree_id, remaining_ms FROM criteria_timers WHERE actor_id = ?1")?;
        let rows = stmt.query_map(params![actor_key], |row| {
            Ok((row.get::<_, i64>(0)? as u32, row.get::<_, i64>(1)?))
        })?;
        for row in rows {
            let (tree, remaining) = row?;
            match u32::try_from(remaining) {
                Ok(remaining) if remaining > 0 => state.timers.start(TreeId(tree), remaining),
                _ => debug!("dropping stale timer on tree {} for {}", tree, actor),
            }
        }

        let mut stmt = self
            .conn
            .prepare("SELECT tree_id FROM criteria_completed WHERE actor_id = ?1")?;
        let rows = stmt.query_map(params![actor_key], |row| row.get::<_, i64>(0))?;
        let mut completed = Vec::new();
        for row in rows {
            completed.push(TreeId(row? as u32));
        }
        state.restore_reported(completed);

        Ok(state)
    }

    /// Writes unsaved records, deletes removed ones and replaces the timer set.
///
/// The completed set is rewritten whenever it changed since the last save.
    pub fn save_actor(&mut self, state: &mut ActorCriteria) -> Result<(), ProgressDbError> {
        let actor_key = actor_to_sql(state.actor);
        let tx = self.conn.transaction()?;

        for (criterion, record) in state.progress.unsaved_records() {
            tx.execute(
                "INSERT OR REPLACE INTO criteria_progress (actor_id, criterion_id, counter, updated_at, owner_id) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    actor_key,
                    criterion.0 as i64,
                    counter_to_sql(record.counter),
                    record.updated_at,
                    actor_to_sql(record.owner)
                ],
            )?;
        }
        for criterion in state.progress.removed() {
            tx.execute(
                "DELETE FROM criteria_progress WHERE actor_id = ?1 AND criterion_id = ?2",
                params![actor_key, criterion.0 as i64],
            )?;
        }

        tx.execute(
            "DELETE FROM criteria_timers WHERE actor_id = ?1",
            params![actor_key],
        )?;
        for (tree, remaining) in state.timers.iter() {
            tx.execute(
                "INSERT INTO criteria_timers (actor_id, tree_id, remaining_ms) VALUES (?1, ?2, ?3)",
                params![actor_key, tree.0 as i64, remaining as i64],
            )?;
        }

        if state.completions_changed() {
            tx.execute(
                "DELETE FROM criteria_completed WHERE actor_id = ?1",
                params![actor_key],
            )?;
            for tree in state.reported_trees() {
                tx.execute(
                    "INSERT INTO criteria_completed (actor_id, tree_id) VALUES (?1, ?2)",
                    params![actor_key, tree.0 as i64],
                )?;
            }
        }

        tx.commit()?;
        state.mark_saved();
        Ok(())
    }

    pub fn delete_actor(&mut self, actor: ActorId) -> Result<(), ProgressDbError> {
        let actor_key = actor_to_sql(actor);
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM criteria_progress WHERE actor_id = ?1",
            params![actor_key],
        )?;
        tx.execute(
            "DELETE FROM criteria_timers WHERE actor_id = ?1",
            params![actor_key],
        )?;
        tx.execute(
            "DELETE FROM criteria_completed WHERE actor_id = ?1",
            params![actor_key],
        )?;
        tx.commit()?;
        Ok(())
    }
}

impl crate::world::repository::ProgressRepository for SqliteProgressDb {
    fn load_actor(&self, actor: ActorId) -> Result<ActorCriteria, Box<dyn std::error::Error>> {
        Ok(SqliteProgressDb::load_actor(self, actor)?)
    }

    fn save_actor(&mut self, state: &mut ActorCriteria) -> Result<(), Box<dyn std::error::Error>> {
        Ok(SqliteProgressDb::save_actor(self, state)?)
    }

    fn delete_actor(&mut self, actor: ActorId) -> Result<(), Box<dyn std::error::Error>> {
        Ok(SqliteProgressDb::delete_actor(self, actor)?)
    }
}
